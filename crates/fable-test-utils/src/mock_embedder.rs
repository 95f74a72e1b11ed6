// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.
//!
//! Texts are embedded as L2-normalized hashed bag-of-words vectors, so texts
//! sharing words land close together. Specific texts can be pinned to fixed
//! vectors when a test needs exact geometry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use fable_core::traits::{EmbeddingAdapter, PluginAdapter};
use fable_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use fable_core::FableError;

/// A deterministic mock embedding service.
pub struct MockEmbedder {
    dimension: usize,
    pinned: HashMap<String, Vec<f32>>,
    calls: Arc<AtomicUsize>,
    failure: Option<String>,
}

impl MockEmbedder {
    /// Create an embedder producing vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            pinned: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            failure: None,
        }
    }

    /// Create an embedder whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(8)
        }
    }

    /// Pin `text` to an exact vector. The vector is used as given.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.pinned.insert(text.into(), vector);
        self
    }

    /// Number of `embed` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.get(text) {
            return v.clone();
        }

        let mut v = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            v[idx] += 1.0;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, FableError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FableError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(FableError::Embedding {
                message: message.clone(),
                source: None,
            });
        }

        let embeddings: Vec<Vec<f32>> = input.texts.iter().map(|t| self.vector_for(t)).collect();
        let dimensions = embeddings.first().map_or(self.dimension, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
