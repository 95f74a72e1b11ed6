// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::FableError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for generating vector embeddings from text.
///
/// Embedding adapters power similarity retrieval in the memory stores.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates embeddings for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FableError>;

    /// Vector length every embedding will have, when fixed by configuration.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Embeds a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, FableError> {
        let output = self
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| FableError::Embedding {
                message: "embedding service returned no vectors".to_string(),
                source: None,
            })
    }
}
