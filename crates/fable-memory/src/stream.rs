// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rated, time-stamped record stream behind time-weighted memory.
//!
//! Every insertion is rated for importance and embedded. Retrieval comes in
//! two flavours: time-weighted (similarity + recency + importance, refreshing
//! access times) and pure similarity (read-only, used by reflection).

use std::sync::Arc;

use fable_config::model::MemoryConfig;
use fable_core::types::EmbeddingInput;
use fable_core::{Clock, CompletionAdapter, EmbeddingAdapter, FableError};
use tracing::debug;

use crate::importance::ImportanceRater;
use crate::index::VectorIndex;
use crate::types::{MemoryRecord, RecordId, RecordKind, ScoredRecord, relevance_from_distance};

/// Timestamp format used when rendering records for prompts.
const DETAIL_TIME_FORMAT: &str = "%B %d, %Y, %I:%M %p";

pub struct MemoryStream {
    completion: Arc<dyn CompletionAdapter>,
    embedder: Arc<dyn EmbeddingAdapter>,
    clock: Arc<dyn Clock>,
    rater: ImportanceRater,
    index: VectorIndex,
    decay_rate: f64,
    importance_weight: f64,
}

impl MemoryStream {
    pub fn new(
        completion: Arc<dyn CompletionAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
        clock: Arc<dyn Clock>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            index: VectorIndex::for_embedder(embedder.as_ref()),
            completion,
            embedder,
            clock,
            rater: ImportanceRater::new(config.max_importance),
            decay_rate: config.decay_rate,
            importance_weight: config.importance_weight,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn completion(&self) -> &dyn CompletionAdapter {
        self.completion.as_ref()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rate, embed, and store one record. Returns its id and importance.
    pub async fn add(
        &mut self,
        content: &str,
        kind: RecordKind,
    ) -> Result<(RecordId, f64), FableError> {
        let importance = self.rater.rate(self.completion.as_ref(), content).await?;
        let embedding = self.embedder.embed_one(content).await?;
        let id = self.index.insert(
            content.to_string(),
            embedding,
            kind,
            importance,
            self.clock.now(),
        )?;
        debug!(record_id = id, importance, kind = self.index_kind(id), "added memory");
        Ok((id, importance))
    }

    /// Rate each text, embed them in one batch, and store them in order.
    ///
    /// Returns the summed importance of the batch.
    pub async fn add_batch(&mut self, texts: &[String], kind: RecordKind) -> Result<f64, FableError> {
        if texts.is_empty() {
            return Ok(0.0);
        }

        let mut ratings = Vec::with_capacity(texts.len());
        for text in texts {
            ratings.push(self.rater.rate(self.completion.as_ref(), text).await?);
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
        for ((text, embedding), importance) in texts.iter().zip(output.embeddings).zip(&ratings) {
            self.index
                .insert(text.clone(), embedding, kind.clone(), *importance, now)?;
        }
        Ok(ratings.iter().sum())
    }

    /// The `last_k` most recent records, oldest first.
    pub fn recent(&self, last_k: usize) -> &[MemoryRecord] {
        self.index.recent(last_k)
    }

    /// Top `k` records by semantic relevance alone. Access times are untouched.
    pub async fn similar(&self, query: &str, k: usize) -> Result<Vec<ScoredRecord>, FableError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_one(query).await?;
        let scores = self
            .index
            .score_all_with(&embedding, |sq, _| relevance_from_distance(sq))?;
        Ok(self.index.top_k(scores, k))
    }

    /// Top `k` records by relevance + recency + weighted importance.
    ///
    /// Returned records have `last_accessed_at` refreshed to now.
    pub async fn time_weighted(
        &mut self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredRecord>, FableError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed_one(query).await?;
        let now = self.clock.now();
        let max_importance = self.rater.max_importance();
        let (decay_rate, importance_weight) = (self.decay_rate, self.importance_weight);

        let scores = self.index.score_all_with(&embedding, |sq, record| {
            let hours = (now - record.last_accessed_at).num_milliseconds().max(0) as f64
                / 3_600_000.0;
            let recency = (1.0 - decay_rate).powf(hours);
            let importance = importance_weight * record.importance / max_importance;
            relevance_from_distance(sq) + recency + importance
        })?;

        let mut hits = self.index.top_k(scores, k);
        for hit in &mut hits {
            self.index.touch(hit.record.id, now);
            hit.record.last_accessed_at = now;
        }
        Ok(hits)
    }

    /// Render a record as `[id] [timestamp] content`.
    pub fn render(record: &MemoryRecord) -> String {
        format!(
            "[{}] [{}] {}",
            record.id,
            record.created_at.format(DETAIL_TIME_FORMAT),
            record.content.trim()
        )
    }

    pub fn render_all<'a>(records: impl IntoIterator<Item = &'a MemoryRecord>) -> String {
        records
            .into_iter()
            .map(Self::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn index_kind(&self, id: RecordId) -> &'static str {
        self.index.get(id).map_or("unknown", |r| r.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fable_test_utils::{ManualClock, MockCompletion, MockEmbedder};

    fn stream_with(
        completion: MockCompletion,
        embedder: MockEmbedder,
        clock: Arc<ManualClock>,
    ) -> MemoryStream {
        MemoryStream::new(
            Arc::new(completion),
            Arc::new(embedder),
            clock,
            &MemoryConfig::default(),
        )
    }

    #[tokio::test]
    async fn add_rates_and_stores() {
        let clock = Arc::new(ManualClock::fixed());
        let mut stream = stream_with(
            MockCompletion::with_responses(["8"]),
            MockEmbedder::new(8),
            clock,
        );
        let (id, importance) = stream
            .add("Nick breaks up with Hannah.", RecordKind::Conversation)
            .await
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(importance, 8.0);
        assert_eq!(stream.index().get(0).unwrap().importance, 8.0);
    }

    #[tokio::test]
    async fn render_uses_long_timestamp() {
        let clock = Arc::new(ManualClock::fixed());
        let mut stream = stream_with(
            MockCompletion::with_responses(["3"]),
            MockEmbedder::new(8),
            clock,
        );
        stream.add("Nick meets Eliza.", RecordKind::Background).await.unwrap();
        let rendered = MemoryStream::render(stream.index().get(0).unwrap());
        assert_eq!(rendered, "[0] [March 01, 2026, 10:00 AM] Nick meets Eliza.");
    }

    #[tokio::test]
    async fn recency_favours_recently_accessed_records() {
        let clock = Arc::new(ManualClock::fixed());
        let embedder = MockEmbedder::new(2)
            .with_vector("old", vec![1.0, 0.0])
            .with_vector("new", vec![1.0, 0.0])
            .with_vector("query", vec![1.0, 0.0]);
        let mut stream = stream_with(
            MockCompletion::with_responses(["5", "5"]),
            embedder,
            clock.clone(),
        );

        stream.add("old", RecordKind::Background).await.unwrap();
        clock.advance(Duration::hours(48));
        stream.add("new", RecordKind::Background).await.unwrap();

        let hits = stream.time_weighted("query", 2).await.unwrap();
        assert_eq!(hits[0].record.content, "new");
        assert!(hits[0].score > hits[1].score);
        assert!(hits.iter().all(|h| h.record.last_accessed_at == clock.now()));
        assert_eq!(stream.index().get(0).unwrap().last_accessed_at, clock.now());
    }

    #[tokio::test]
    async fn importance_breaks_otherwise_equal_scores() {
        let clock = Arc::new(ManualClock::fixed());
        let embedder = MockEmbedder::new(2)
            .with_vector("mundane", vec![0.0, 1.0])
            .with_vector("poignant", vec![0.0, 1.0])
            .with_vector("query", vec![0.0, 1.0]);
        let mut stream = stream_with(
            MockCompletion::with_responses(["1", "9"]),
            embedder,
            clock,
        );
        stream.add("mundane", RecordKind::Background).await.unwrap();
        stream.add("poignant", RecordKind::Background).await.unwrap();

        let hits = stream.time_weighted("query", 1).await.unwrap();
        assert_eq!(hits[0].record.content, "poignant");
    }

    #[tokio::test]
    async fn similarity_search_does_not_touch_records() {
        let clock = Arc::new(ManualClock::fixed());
        let mut stream = stream_with(
            MockCompletion::with_responses(["2"]),
            MockEmbedder::new(8),
            clock.clone(),
        );
        stream.add("Nick meets Eliza.", RecordKind::Background).await.unwrap();
        let before = stream.index().get(0).unwrap().last_accessed_at;
        clock.advance(Duration::hours(3));

        let hits = stream.similar("Eliza", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(stream.index().get(0).unwrap().last_accessed_at, before);
    }

    #[tokio::test]
    async fn batch_sums_importance() {
        let clock = Arc::new(ManualClock::fixed());
        let mut stream = stream_with(
            MockCompletion::with_responses(["2", "3", "4"]),
            MockEmbedder::new(8),
            clock,
        );
        let texts: Vec<String> = ["a b", "c d", "e f"].iter().map(|s| s.to_string()).collect();
        let total = stream.add_batch(&texts, RecordKind::Background).await.unwrap();
        assert_eq!(total, 9.0);
        assert_eq!(stream.len(), 3);
    }
}
