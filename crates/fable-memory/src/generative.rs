// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-weighted reflective memory.
//!
//! Extends similarity retrieval with recency and importance, and tracks the
//! cumulative importance of everything inserted. When that total exceeds
//! the reflection threshold, a reflection pass runs to completion before the
//! triggering insertion returns, after which the total resets to zero.

use std::sync::Arc;

use fable_config::model::MemoryConfig;
use fable_core::{Clock, CompletionAdapter, EmbeddingAdapter, FableError};
use tracing::{debug, info};

use crate::buffer::TranscriptBuffer;
use crate::reflection::{ReflectionEngine, ReflectionState};
use crate::stream::MemoryStream;
use crate::types::{ContextWindow, RecordKind, ScoredRecord};

pub struct TimeWeightedMemory {
    stream: MemoryStream,
    reflection: ReflectionEngine,
    transcript: TranscriptBuffer,
    k: usize,
    reflection_threshold: f64,
    cumulative_importance: f64,
}

impl TimeWeightedMemory {
    pub fn new(
        agent_name: impl Into<String>,
        completion: Arc<dyn CompletionAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
        clock: Arc<dyn Clock>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            stream: MemoryStream::new(completion, embedder, clock, config),
            reflection: ReflectionEngine::new(config),
            transcript: TranscriptBuffer::new(agent_name),
            k: config.generative_k,
            reflection_threshold: config.reflection_threshold,
            cumulative_importance: 0.0,
        }
    }

    pub fn stream(&self) -> &MemoryStream {
        &self.stream
    }

    pub fn reflection(&self) -> &ReflectionEngine {
        &self.reflection
    }

    pub fn cumulative_importance(&self) -> f64 {
        self.cumulative_importance
    }

    /// Seed background texts, then reflect if the batch pushed importance over the threshold.
    pub async fn record_background(&mut self, texts: &[String]) -> Result<(), FableError> {
        let total = self.stream.add_batch(texts, RecordKind::Background).await?;
        self.cumulative_importance += total;
        debug!(
            count = texts.len(),
            cumulative_importance = self.cumulative_importance,
            "seeded background memories"
        );
        self.maybe_reflect().await
    }

    /// Store one exchange as a single memory.
    pub async fn record_turn(&mut self, user_text: &str, agent_text: &str) -> Result<(), FableError> {
        let content = self.transcript.render_turn(user_text, agent_text);
        self.transcript.push(user_text, agent_text);
        self.add_memory(&content, RecordKind::Conversation).await
    }

    /// Insert one record, reflecting synchronously when the threshold is crossed.
    pub async fn add_memory(&mut self, content: &str, kind: RecordKind) -> Result<(), FableError> {
        let (_, importance) = self.stream.add(content, kind).await?;
        self.cumulative_importance += importance;
        self.maybe_reflect().await
    }

    /// Top `k` by combined score; refreshes access times of returned records.
    pub async fn retrieve(&mut self, query: &str) -> Result<Vec<ScoredRecord>, FableError> {
        self.stream.time_weighted(query, self.k).await
    }

    pub async fn build_context(&mut self, query: &str) -> Result<ContextWindow, FableError> {
        let hits = self.retrieve(query).await?;
        Ok(ContextWindow {
            transcript: self.transcript.render(),
            retrieved: MemoryStream::render_all(hits.iter().map(|h| &h.record)),
        })
    }

    pub fn transcript(&self) -> &TranscriptBuffer {
        &self.transcript
    }

    async fn maybe_reflect(&mut self) -> Result<(), FableError> {
        if self.cumulative_importance <= self.reflection_threshold
            || self.reflection.state() == ReflectionState::Reflecting
        {
            return Ok(());
        }

        info!(
            cumulative_importance = self.cumulative_importance,
            threshold = self.reflection_threshold,
            "reflection threshold crossed"
        );
        self.reflection.reflect(&mut self.stream).await?;
        self.cumulative_importance = 0.0;
        Ok(())
    }
}
