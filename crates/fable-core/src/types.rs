// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapters, memory stores, and the dialogue loop.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::error::FableError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external service an adapter wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Completion,
    Embedding,
}

/// Capability tier requested from the completion service.
///
/// Offline generation (descriptions, rewrites) uses `Capable`; per-turn
/// dialogue, importance rating, and reflection use `Fast`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Fast,
    Capable,
}

/// The closed set of chatbot flavours. Each maps to one memory strategy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatbotKind {
    /// Transcript buffer only.
    Summary,
    /// Similarity retrieval over background texts and past turns.
    Retrieval,
    /// Similarity retrieval over background texts only.
    SummaryRetrieval,
    /// Time-weighted retrieval with importance-triggered reflection.
    Generative,
}

impl ChatbotKind {
    /// Parse a user-supplied tag, rejecting anything outside the closed set.
    pub fn parse(tag: &str) -> Result<Self, FableError> {
        ChatbotKind::from_str(tag.trim()).map_err(|_| {
            FableError::Config(format!(
                "unknown chatbot kind `{tag}` (expected one of: {})",
                ChatbotKind::VARIANTS.join(", ")
            ))
        })
    }
}

/// A request to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The full prompt text.
    pub prompt: String,
    /// Requested capability tier.
    pub tier: ModelTier,
    /// Optional cap on generated tokens; adapters fall back to their default.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, tier: ModelTier) -> Self {
        Self {
            prompt: prompt.into(),
            tier,
            max_tokens: None,
        }
    }
}

/// The completion service's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Model identifier that produced the text.
    pub model: String,
}

/// Input for embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector per text.
    pub texts: Vec<String>,
}

/// Output from embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality shared by every vector.
    pub dimensions: usize,
}

/// A character persona derived from a corpus.
///
/// Serializes to exactly these four fields; unknown fields are rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Persona {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub greeting: String,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One entry in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Position in the transcript, contiguous from 0.
    pub sequence: usize,
}
