// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express,
//! such as positive retrieval sizes and a decay rate inside `[0, 1)`.

use crate::diagnostic::ConfigError;
use crate::model::FableConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &FableConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.openai.base_url.trim().is_empty() {
        fail("openai.base_url must not be empty".to_string());
    }
    if config.openai.embedding_dimension == 0 {
        fail("openai.embedding_dimension must be at least 1".to_string());
    }
    if config.openai.timeout_secs == 0 {
        fail("openai.timeout_secs must be at least 1".to_string());
    }

    // A target below 2 leaves no room for a lower bound strictly under it.
    for (key, target) in [
        ("persona.short_target", config.persona.short_target),
        ("persona.long_target", config.persona.long_target),
    ] {
        if target < 2 {
            fail(format!("{key} must be at least 2, got {target}"));
        }
    }
    if config.persona.max_rewrite_attempts == 0 {
        fail("persona.max_rewrite_attempts must be at least 1".to_string());
    }
    if config.persona.num_characters == 0 {
        fail("persona.num_characters must be at least 1".to_string());
    }

    let memory = &config.memory;
    for (key, k) in [
        ("memory.retrieval_k", memory.retrieval_k),
        ("memory.summary_retrieval_k", memory.summary_retrieval_k),
        ("memory.generative_k", memory.generative_k),
        ("memory.reflection_last_k", memory.reflection_last_k),
        ("memory.num_topics", memory.num_topics),
        ("memory.num_insights_per_topic", memory.num_insights_per_topic),
    ] {
        if k == 0 {
            fail(format!("{key} must be at least 1"));
        }
    }
    if !(0.0..1.0).contains(&memory.decay_rate) {
        fail(format!(
            "memory.decay_rate must be in [0, 1), got {}",
            memory.decay_rate
        ));
    }
    if memory.max_importance <= 0.0 {
        fail(format!(
            "memory.max_importance must be positive, got {}",
            memory.max_importance
        ));
    }
    if memory.importance_weight < 0.0 {
        fail(format!(
            "memory.importance_weight must be non-negative, got {}",
            memory.importance_weight
        ));
    }
    if memory.reflection_threshold <= 0.0 {
        fail(format!(
            "memory.reflection_threshold must be positive, got {}",
            memory.reflection_threshold
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
