// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity-retrieval memory.
//!
//! Background texts (and, optionally, each completed turn) are embedded into
//! a [`VectorIndex`]. Every turn the query is embedded and the `k` nearest
//! records are rendered as `[id] content` lines.

use std::sync::Arc;

use fable_core::types::EmbeddingInput;
use fable_core::{Clock, EmbeddingAdapter, FableError};
use tracing::debug;

use crate::buffer::TranscriptBuffer;
use crate::index::VectorIndex;
use crate::types::{ContextWindow, RecordKind, ScoredRecord};

pub struct VectorRetrievalMemory {
    embedder: Arc<dyn EmbeddingAdapter>,
    clock: Arc<dyn Clock>,
    index: VectorIndex,
    transcript: TranscriptBuffer,
    k: usize,
    index_turns: bool,
}

impl VectorRetrievalMemory {
    /// Create a retrieval memory returning `k` records per query.
    ///
    /// With `index_turns` false only background texts are searchable.
    pub fn new(
        agent_name: impl Into<String>,
        embedder: Arc<dyn EmbeddingAdapter>,
        clock: Arc<dyn Clock>,
        k: usize,
        index_turns: bool,
    ) -> Self {
        Self {
            index: VectorIndex::for_embedder(embedder.as_ref()),
            embedder,
            clock,
            transcript: TranscriptBuffer::new(agent_name),
            k,
            index_turns,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Embed all texts in one batch and store them in order.
    pub async fn record_background(&mut self, texts: &[String]) -> Result<(), FableError> {
        if texts.is_empty() {
            return Ok(());
        }

        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: texts.to_vec(),
            })
            .await?;
        if output.embeddings.len() != texts.len() {
            return Err(FableError::Embedding {
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    output.embeddings.len()
                ),
                source: None,
            });
        }

        self.index.check_batch(&output.embeddings)?;

        let now = self.clock.now();
        for (text, embedding) in texts.iter().zip(output.embeddings) {
            self.index
                .insert(text.clone(), embedding, RecordKind::Background, 0.0, now)?;
        }
        debug!(count = texts.len(), total = self.index.len(), "seeded background records");
        Ok(())
    }

    /// Append the turn to the transcript, then index it when turns are
    /// searchable. The transcript keeps the turn even if embedding fails.
    pub async fn record_turn(&mut self, user_text: &str, agent_text: &str) -> Result<(), FableError> {
        self.transcript.push(user_text, agent_text);
        if self.index_turns {
            let content = self.transcript.render_turn(user_text, agent_text);
            let embedding = self.embedder.embed_one(&content).await?;
            let id = self.index.insert(
                content,
                embedding,
                RecordKind::Conversation,
                0.0,
                self.clock.now(),
            )?;
            debug!(record_id = id, "indexed conversation turn");
        }
        Ok(())
    }

    /// The `k` records nearest to `query`, best first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredRecord>, FableError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_one(query).await?;
        self.index.nearest(&embedding, self.k)
    }

    pub async fn build_context(&self, query: &str) -> Result<ContextWindow, FableError> {
        let hits = self.retrieve(query).await?;
        Ok(ContextWindow {
            transcript: self.transcript.render(),
            retrieved: render_hits(&hits),
        })
    }

    pub fn transcript(&self) -> &TranscriptBuffer {
        &self.transcript
    }
}

/// Render hits in retrieval order, each prefixed by its stable id.
pub fn render_hits(hits: &[ScoredRecord]) -> String {
    hits.iter()
        .map(|h| format!("[{}] {}", h.record.id, h.record.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
