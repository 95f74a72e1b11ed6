// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Fable persona engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use fable_core::ChatbotKind;
use serde::{Deserialize, Serialize};

/// Top-level Fable configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FableConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Artifact locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// OpenAI-compatible completion and embedding service settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Persona generation settings.
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Conversational memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where summaries, personas, and character lists are read and written.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory; each corpus gets its own subdirectory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("fable"))
        .unwrap_or_else(|| PathBuf::from("output"))
}

/// OpenAI-compatible API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model serving the fast tier (dialogue, importance, reflection).
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model serving the capable tier (descriptions, rewrites, character lists).
    #[serde(default = "default_capable_model")]
    pub capable_model: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Expected embedding dimensionality.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request transport timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            fast_model: default_fast_model(),
            capable_model: default_capable_model(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_fast_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_capable_model() -> String {
    "gpt-4".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    120
}

/// Persona generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersonaConfig {
    /// Character target for the short description.
    #[serde(default = "default_short_target")]
    pub short_target: usize,

    /// Character target for the long description.
    #[serde(default = "default_long_target")]
    pub long_target: usize,

    /// Revision cap for the length-constrained rewriter.
    #[serde(default = "default_max_rewrite_attempts")]
    pub max_rewrite_attempts: usize,

    /// How many characters to keep when listing a corpus's cast.
    #[serde(default = "default_num_characters")]
    pub num_characters: usize,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            short_target: default_short_target(),
            long_target: default_long_target(),
            max_rewrite_attempts: default_max_rewrite_attempts(),
            num_characters: default_num_characters(),
        }
    }
}

fn default_short_target() -> usize {
    50
}

fn default_long_target() -> usize {
    500
}

fn default_max_rewrite_attempts() -> usize {
    10
}

fn default_num_characters() -> usize {
    10
}

/// Conversational memory configuration.
///
/// Importance is on a `0..=max_importance` scale; `reflection_threshold` is
/// compared against the running sum of raw importance scores.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Which chatbot flavour (and therefore memory strategy) to run.
    #[serde(default = "default_chatbot")]
    pub chatbot: ChatbotKind,

    /// Records retrieved per turn by the `retrieval` flavour.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    /// Records retrieved per turn by the `summary_retrieval` flavour.
    #[serde(default = "default_summary_retrieval_k")]
    pub summary_retrieval_k: usize,

    /// Records retrieved per turn by the `generative` flavour.
    #[serde(default = "default_generative_k")]
    pub generative_k: usize,

    /// Recency decay per hour since last access, in `[0, 1)`.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Upper end of the importance scale.
    #[serde(default = "default_max_importance")]
    pub max_importance: f64,

    /// Weight of normalized importance in the combined retrieval score.
    #[serde(default = "default_importance_weight")]
    pub importance_weight: f64,

    /// Cumulative importance that triggers a reflection pass.
    #[serde(default = "default_reflection_threshold")]
    pub reflection_threshold: f64,

    /// How many recent records a reflection pass looks at.
    #[serde(default = "default_reflection_last_k")]
    pub reflection_last_k: usize,

    /// Questions asked per reflection pass.
    #[serde(default = "default_num_topics")]
    pub num_topics: usize,

    /// Insights synthesized per question.
    #[serde(default = "default_num_insights_per_topic")]
    pub num_insights_per_topic: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chatbot: default_chatbot(),
            retrieval_k: default_retrieval_k(),
            summary_retrieval_k: default_summary_retrieval_k(),
            generative_k: default_generative_k(),
            decay_rate: default_decay_rate(),
            max_importance: default_max_importance(),
            importance_weight: default_importance_weight(),
            reflection_threshold: default_reflection_threshold(),
            reflection_last_k: default_reflection_last_k(),
            num_topics: default_num_topics(),
            num_insights_per_topic: default_num_insights_per_topic(),
        }
    }
}

fn default_chatbot() -> ChatbotKind {
    ChatbotKind::Generative
}

fn default_retrieval_k() -> usize {
    20
}

fn default_summary_retrieval_k() -> usize {
    12
}

fn default_generative_k() -> usize {
    20
}

fn default_decay_rate() -> f64 {
    0.01
}

fn default_max_importance() -> f64 {
    10.0
}

fn default_importance_weight() -> f64 {
    0.15
}

fn default_reflection_threshold() -> f64 {
    // Equivalent to a threshold of 2.0 on the 0.15-weighted normalized scale.
    2.0 / (0.15 / 10.0)
}

fn default_reflection_last_k() -> usize {
    50
}

fn default_num_topics() -> usize {
    3
}

fn default_num_insights_per_topic() -> usize {
    1
}
