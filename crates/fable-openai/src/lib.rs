// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible adapter for the Fable persona engine.
//!
//! One [`OpenAiAdapter`] serves both completion tiers and embeddings.
//! Tiers map to models from `[openai]` config: `fast_model` for dialogue,
//! importance ratings, greetings, and reflection; `capable_model` for
//! descriptions, rewrites, and character listing.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use fable_config::model::OpenAiConfig;
use fable_core::error::FableError;
use fable_core::traits::{CompletionAdapter, EmbeddingAdapter, PluginAdapter};
use fable_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, EmbeddingInput, EmbeddingOutput,
    HealthStatus, ModelTier,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest, EmbeddingRequest};

/// Environment variable consulted when `openai.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Completion and embedding adapter over an OpenAI-compatible API.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiAdapter {
    client: OpenAiClient,
    fast_model: String,
    capable_model: String,
    embedding_model: String,
    embedding_dimension: usize,
    max_tokens: u32,
}

impl OpenAiAdapter {
    pub fn new(config: &OpenAiConfig) -> Result<Self, FableError> {
        let api_key = resolve_api_key(&config.api_key)?;
        Self::with_api_key(config, &api_key)
    }

    /// Build with an explicit key, bypassing config and environment lookup.
    pub fn with_api_key(config: &OpenAiConfig, api_key: &str) -> Result<Self, FableError> {
        let client = OpenAiClient::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )
        .map_err(FableError::Config)?;

        info!(
            base_url = client.base_url(),
            fast_model = %config.fast_model,
            capable_model = %config.capable_model,
            embedding_model = %config.embedding_model,
            "OpenAI adapter initialized"
        );

        Ok(Self {
            client,
            fast_model: config.fast_model.clone(),
            capable_model: config.capable_model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimension: config.embedding_dimension,
            max_tokens: config.max_tokens,
        })
    }

    /// The model serving `tier`.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Capable => &self.capable_model,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, FableError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiAdapter {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, FableError> {
        let model = self.model_for(request.tier).to_string();
        let api_request = ChatRequest {
            model: model.clone(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: request.prompt,
            }],
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
        };

        let response = self
            .client
            .chat(&api_request)
            .await
            .map_err(|f| FableError::Completion {
                message: f.message,
                source: f.source,
            })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| FableError::Completion {
                message: format!("{model} returned no choices"),
                source: None,
            })?;
        debug!(
            model = %response.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            "completion received"
        );

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiAdapter {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FableError> {
        let expected = input.texts.len();
        if expected == 0 {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: self.embedding_dimension,
            });
        }

        let response = self
            .client
            .embeddings(&EmbeddingRequest {
                model: self.embedding_model.clone(),
                input: input.texts,
            })
            .await
            .map_err(|f| FableError::Embedding {
                message: f.message,
                source: f.source,
            })?;

        let mut data = response.data;
        if data.len() != expected {
            return Err(FableError::Embedding {
                message: format!("expected {expected} embeddings, got {}", data.len()),
                source: None,
            });
        }
        data.sort_by_key(|d| d.index);

        if let Some(bad) = data
            .iter()
            .find(|d| d.embedding.len() != self.embedding_dimension)
        {
            return Err(FableError::Embedding {
                message: format!(
                    "embedding has {} dimensions, configured for {}",
                    bad.embedding.len(),
                    self.embedding_dimension
                ),
                source: None,
            });
        }

        debug!(count = expected, "embeddings received");
        Ok(EmbeddingOutput {
            embeddings: data.into_iter().map(|d| d.embedding).collect(),
            dimensions: self.embedding_dimension,
        })
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.embedding_dimension)
    }
}

/// Resolves the API key from config, falling back to `OPENAI_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, FableError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV).map_err(|_| {
        FableError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}
