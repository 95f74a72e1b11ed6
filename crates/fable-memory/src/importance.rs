// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Importance rating for time-weighted memories.

use std::sync::LazyLock;

use fable_core::template::fill;
use fable_core::{CompletionAdapter, FableError, ModelTier};
use regex::Regex;
use tracing::warn;

/// Prompt asking for a poignancy score. `{max}` and `{memory}` are replaced.
const IMPORTANCE_PROMPT: &str = "On the scale of 1 to {max}, where 1 is purely mundane \
(e.g., brushing teeth, making bed) and {max} is extremely poignant (e.g., a break up, \
college acceptance), rate the likely poignancy of the following piece of memory. \
Respond with a single integer.\nMemory: {memory}\nRating: ";

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*?(\d+(?:\.\d+)?)").expect("static regex is valid"));

/// Rates memories on `[0, max_importance]` via the fast completion tier.
#[derive(Debug, Clone, Copy)]
pub struct ImportanceRater {
    max_importance: f64,
}

impl ImportanceRater {
    pub fn new(max_importance: f64) -> Self {
        Self { max_importance }
    }

    pub fn max_importance(&self) -> f64 {
        self.max_importance
    }

    pub fn prompt(&self, memory: &str) -> String {
        let max = self.max_importance.to_string();
        fill(
            IMPORTANCE_PROMPT,
            &[("max", max.as_str()), ("memory", memory.trim())],
        )
    }

    /// Parse the first number in `reply`, clamped to the scale. A reply with
    /// no number rates 0.
    pub fn parse(&self, reply: &str) -> f64 {
        match FIRST_NUMBER
            .captures(reply.trim())
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            Some(score) => score.clamp(0.0, self.max_importance),
            None => {
                warn!(reply = %reply, "importance reply had no number; rating 0");
                0.0
            }
        }
    }

    pub async fn rate(
        &self,
        completion: &dyn CompletionAdapter,
        memory: &str,
    ) -> Result<f64, FableError> {
        let reply = completion
            .complete_text(&self.prompt(memory), ModelTier::Fast)
            .await?;
        Ok(self.parse(&reply))
    }
}
