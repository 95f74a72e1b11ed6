// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fable persona engine.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across all Fable adapter traits and core operations.
#[derive(Debug, Error)]
pub enum FableError {
    /// Configuration errors (invalid TOML, unknown chatbot kind, inverted bounds).
    #[error("configuration error: {0}")]
    Config(String),

    /// The length-constrained rewriter exhausted its revision budget.
    ///
    /// Carries the last draft so callers can inspect or salvage it.
    #[error(
        "length did not converge to [{lower}, {upper}] after {attempts} revisions (last draft has {length} characters)"
    )]
    LengthConvergence {
        attempts: usize,
        length: usize,
        lower: usize,
        upper: usize,
        last_draft: String,
    },

    /// Completion service errors (transport failure, quota, malformed reply).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding service errors (transport failure, dimension mismatch).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A persisted artifact exists but cannot be trusted.
    #[error("corrupt cache artifact {}: {message}", path.display())]
    CacheCorruption { path: PathBuf, message: String },

    /// Filesystem errors while reading or writing artifacts.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FableError {
    /// Short, stable name of the error kind for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FableError::Config(_) => "configuration",
            FableError::LengthConvergence { .. } => "length-convergence",
            FableError::Completion { .. } => "completion",
            FableError::Embedding { .. } => "embedding",
            FableError::CacheCorruption { .. } => "cache-corruption",
            FableError::Storage { .. } => "storage",
            FableError::Internal(_) => "internal",
        }
    }

    /// Whether the error must abort the process rather than just the current step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FableError::Config(_) | FableError::CacheCorruption { .. }
        )
    }
}
