// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory embedding index with exact nearest-neighbour search.
//!
//! Records are append-only and addressed by insertion index, so ids are
//! stable for the index's lifetime. All vectors must share one dimension,
//! fixed by the first insertion unless the embedder declares it up front.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use fable_core::{EmbeddingAdapter, FableError};

use crate::types::{MemoryRecord, RecordId, RecordKind, ScoredRecord, squared_euclidean};

#[derive(Debug, Default)]
pub struct VectorIndex {
    records: Vec<MemoryRecord>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty index that only accepts vectors of `dimension` components.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            records: Vec::new(),
            dimension: Some(dimension),
        }
    }

    /// An empty index sized for whatever `embedder` produces.
    pub fn for_embedder(embedder: &dyn EmbeddingAdapter) -> Self {
        embedder
            .dimension()
            .map_or_else(Self::new, Self::with_dimension)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&MemoryRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get(i))
    }

    /// The `last_k` most recently inserted records, oldest first.
    pub fn recent(&self, last_k: usize) -> &[MemoryRecord] {
        let start = self.records.len().saturating_sub(last_k);
        &self.records[start..]
    }

    /// Append a record and return its id.
    pub fn insert(
        &mut self,
        content: String,
        embedding: Vec<f32>,
        kind: RecordKind,
        importance: f64,
        now: DateTime<Utc>,
    ) -> Result<RecordId, FableError> {
        self.check_dimension(&embedding)?;
        if self.dimension.is_none() {
            self.dimension = Some(embedding.len());
        }

        let id = self.records.len() as RecordId;
        self.records.push(MemoryRecord {
            id,
            content,
            created_at: now,
            last_accessed_at: now,
            importance,
            embedding,
            kind,
        });
        Ok(id)
    }

    /// The `k` records nearest to `query`, scored by negative squared
    /// Euclidean distance. Equal scores are ordered by ascending id.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>, FableError> {
        let scores = self.score_all(query, |sq| -sq)?;
        Ok(self.top_k(scores, k))
    }

    /// Score every record with `score(squared_distance, record)`.
    pub(crate) fn score_all_with<F>(
        &self,
        query: &[f32],
        mut score: F,
    ) -> Result<Vec<(usize, f64)>, FableError>
    where
        F: FnMut(f64, &MemoryRecord) -> f64,
    {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query)?;
        Ok(self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, score(squared_euclidean(query, &r.embedding), r)))
            .collect())
    }

    fn score_all<F>(&self, query: &[f32], score: F) -> Result<Vec<(usize, f64)>, FableError>
    where
        F: Fn(f64) -> f64,
    {
        self.score_all_with(query, |sq, _| score(sq))
    }

    /// Sort `(position, score)` pairs best-first and materialize the top `k`.
    pub(crate) fn top_k(&self, mut scores: Vec<(usize, f64)>, k: usize) -> Vec<ScoredRecord> {
        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scores.truncate(k);
        scores
            .into_iter()
            .map(|(i, score)| ScoredRecord {
                record: self.records[i].clone(),
                score,
            })
            .collect()
    }

    /// Mark a record as accessed at `now`.
    pub fn touch(&mut self, id: RecordId, now: DateTime<Utc>) {
        if let Some(record) = usize::try_from(id).ok().and_then(|i| self.records.get_mut(i)) {
            record.last_accessed_at = now;
        }
    }

    /// Check a batch of vectors against the index (and each other) before
    /// inserting any of them.
    pub fn check_batch(&self, embeddings: &[Vec<f32>]) -> Result<(), FableError> {
        let expected = self
            .dimension
            .or_else(|| embeddings.first().map(Vec::len));
        match embeddings.iter().find(|e| Some(e.len()) != expected) {
            Some(bad) => Err(FableError::Embedding {
                message: format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    expected.unwrap_or_default(),
                    bad.len()
                ),
                source: None,
            }),
            None => Ok(()),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), FableError> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(FableError::Embedding {
                message: format!(
                    "embedding dimension mismatch: expected {expected}, got {}",
                    vector.len()
                ),
                source: None,
            }),
            _ => Ok(()),
        }
    }
}
