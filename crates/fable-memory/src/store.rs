// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory store: one of three strategies, fixed at construction.

use std::sync::Arc;

use fable_config::model::MemoryConfig;
use fable_core::{ChatbotKind, Clock, CompletionAdapter, EmbeddingAdapter, FableError};
use tracing::debug;

use crate::buffer::BufferMemory;
use crate::generative::TimeWeightedMemory;
use crate::retrieval::VectorRetrievalMemory;
use crate::types::ContextWindow;

/// External services a memory store may call.
#[derive(Clone)]
pub struct MemoryServices {
    pub completion: Arc<dyn CompletionAdapter>,
    pub embedder: Arc<dyn EmbeddingAdapter>,
    pub clock: Arc<dyn Clock>,
}

/// Conversational memory for one session.
pub enum MemoryStore {
    BufferOnly(BufferMemory),
    VectorRetrieval(VectorRetrievalMemory),
    TimeWeightedReflective(TimeWeightedMemory),
}

impl MemoryStore {
    /// Build the strategy that backs `kind`.
    pub fn for_kind(
        kind: ChatbotKind,
        agent_name: &str,
        config: &MemoryConfig,
        services: MemoryServices,
    ) -> Self {
        debug!(%kind, agent = agent_name, "creating memory store");
        match kind {
            ChatbotKind::Summary => MemoryStore::BufferOnly(BufferMemory::new(agent_name)),
            ChatbotKind::Retrieval => MemoryStore::VectorRetrieval(VectorRetrievalMemory::new(
                agent_name,
                services.embedder,
                services.clock,
                config.retrieval_k,
                true,
            )),
            ChatbotKind::SummaryRetrieval => {
                MemoryStore::VectorRetrieval(VectorRetrievalMemory::new(
                    agent_name,
                    services.embedder,
                    services.clock,
                    config.summary_retrieval_k,
                    false,
                ))
            }
            ChatbotKind::Generative => {
                MemoryStore::TimeWeightedReflective(TimeWeightedMemory::new(
                    agent_name,
                    services.completion,
                    services.embedder,
                    services.clock,
                    config,
                ))
            }
        }
    }

    /// Bulk-seed ordered background texts before dialogue begins.
    pub async fn record_background(&mut self, texts: &[String]) -> Result<(), FableError> {
        match self {
            MemoryStore::BufferOnly(m) => {
                m.record_background(texts);
                Ok(())
            }
            MemoryStore::VectorRetrieval(m) => m.record_background(texts).await,
            MemoryStore::TimeWeightedReflective(m) => m.record_background(texts).await,
        }
    }

    /// Record one completed exchange.
    pub async fn record_turn(&mut self, user_text: &str, agent_text: &str) -> Result<(), FableError> {
        match self {
            MemoryStore::BufferOnly(m) => {
                m.record_turn(user_text, agent_text);
                Ok(())
            }
            MemoryStore::VectorRetrieval(m) => m.record_turn(user_text, agent_text).await,
            MemoryStore::TimeWeightedReflective(m) => m.record_turn(user_text, agent_text).await,
        }
    }

    /// Transcript and retrieved context for the next reply.
    pub async fn build_context(&mut self, query: &str) -> Result<ContextWindow, FableError> {
        match self {
            MemoryStore::BufferOnly(m) => Ok(m.build_context()),
            MemoryStore::VectorRetrieval(m) => m.build_context(query).await,
            MemoryStore::TimeWeightedReflective(m) => m.build_context(query).await,
        }
    }

    /// Short name of the active strategy.
    pub fn strategy(&self) -> &'static str {
        match self {
            MemoryStore::BufferOnly(_) => "buffer_only",
            MemoryStore::VectorRetrieval(_) => "vector_retrieval",
            MemoryStore::TimeWeightedReflective(_) => "time_weighted_reflective",
        }
    }

    /// Number of retrievable records; always zero for buffer-only memory.
    pub fn record_count(&self) -> usize {
        match self {
            MemoryStore::BufferOnly(_) => 0,
            MemoryStore::VectorRetrieval(m) => m.index().len(),
            MemoryStore::TimeWeightedReflective(m) => m.stream().len(),
        }
    }
}
