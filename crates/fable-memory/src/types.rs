// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types shared by every memory strategy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable record identifier: the record's insertion index within its store.
pub type RecordId = u64;

/// What a record was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// A rolling summary or other text seeded before dialogue starts.
    Background,
    /// One user/agent exchange.
    Conversation,
    /// An insight synthesized by a reflection pass.
    ReflectionInsight {
        /// The question the insight answers.
        topic: String,
        /// Records the insight cites as evidence.
        supporting_ids: Vec<RecordId>,
    },
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Background => "background",
            RecordKind::Conversation => "conversation",
            RecordKind::ReflectionInsight { .. } => "reflection_insight",
        }
    }
}

/// A single stored memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Insertion index, never reassigned.
    pub id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed whenever time-weighted retrieval returns this record.
    pub last_accessed_at: DateTime<Utc>,
    /// Importance on `[0, max_importance]`; zero for strategies that don't rate.
    pub importance: f64,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub kind: RecordKind,
}

/// A record with its retrieval score. Higher is better.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: MemoryRecord,
    pub score: f64,
}

/// What a memory strategy contributes to one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextWindow {
    /// Every turn so far, one `Speaker: text` line each.
    pub transcript: String,
    /// Retrieved records rendered for the prompt; empty for buffer-only memory.
    pub retrieved: String,
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum()
}

/// Map a squared distance between unit vectors to a relevance in `[0, 1]`.
///
/// Identical vectors score 1, orthogonal ones 0.
pub fn relevance_from_distance(squared_distance: f64) -> f64 {
    (1.0 - squared_distance.sqrt() / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}
