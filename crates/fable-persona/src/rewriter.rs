// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded iterative rewriting into a target character range.
//!
//! The first draft comes from a caller-supplied generation step. Its point
//! of view is classified once, then the draft is revised until its length
//! lands inside the range. Every revision request carries the original
//! draft, so fidelity is measured against the source rather than against
//! the previous attempt.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use fable_core::template::fill;
use fable_core::{CompletionAdapter, FableError, ModelTier};
use tracing::{debug, info, warn};

const POINT_OF_VIEW_PROMPT: &str = "What point of view is the following passage?
---
{passage}
---
Choose one of:
- first person
- second person
- third person";

const REVISION_PROMPT: &str = "Consider the following passage.
---
{passage}
---
Your previous revision was the following:
---
{revision}
---
Your revision contains {num_char} characters.
Re-write the passage to contain {char_limit} characters while preserving the style and content of the original passage.
Cut the least salient points if necessary.
Your revision should be in {perspective}.";

/// `floor(log10(n))`, with the order of magnitude of zero defined as zero.
pub fn order_of_magnitude(n: usize) -> u32 {
    if n == 0 { 0 } else { n.ilog10() }
}

/// Character count as the rewriter measures it.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// An inclusive character-count range with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    lower: usize,
    upper: usize,
}

impl CharRange {
    pub fn new(lower: usize, upper: usize) -> Result<Self, FableError> {
        if lower >= upper {
            return Err(FableError::Config(format!(
                "character range lower bound {lower} must be below upper bound {upper}"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// `[target - 10^floor(log10 target), target]`, e.g. 50 gives `[40, 50]`.
    ///
    /// Drafts run long, so the revision target is the lower bound and the
    /// slack sits above it.
    pub fn for_target(target: usize) -> Result<Self, FableError> {
        let step = 10usize.pow(order_of_magnitude(target));
        let lower = target.checked_sub(step).ok_or_else(|| {
            FableError::Config(format!("description target {target} is too small"))
        })?;
        Self::new(lower, target)
    }

    pub fn lower(&self) -> usize {
        self.lower
    }

    pub fn upper(&self) -> usize {
        self.upper
    }

    pub fn contains(&self, length: usize) -> bool {
        (self.lower..=self.upper).contains(&length)
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Grammatical point of view of a passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOfView {
    First,
    Second,
    Third,
}

impl PointOfView {
    /// Read the classifier's reply. Anything unrecognised counts as first
    /// person, the voice descriptions are requested in.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.to_lowercase();
        if reply.contains("first") {
            PointOfView::First
        } else if reply.contains("second") {
            PointOfView::Second
        } else if reply.contains("third") {
            PointOfView::Third
        } else {
            warn!(reply = %reply, "unrecognised point of view; assuming first person");
            PointOfView::First
        }
    }
}

impl fmt::Display for PointOfView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PointOfView::First => "first person",
            PointOfView::Second => "second person",
            PointOfView::Third => "third person",
        })
    }
}

/// Revises drafts into a character range with a hard revision cap.
pub struct LengthConstrainedRewriter {
    completion: Arc<dyn CompletionAdapter>,
    max_attempts: usize,
    tier: ModelTier,
}

impl LengthConstrainedRewriter {
    pub fn new(completion: Arc<dyn CompletionAdapter>, max_attempts: usize) -> Self {
        Self {
            completion,
            max_attempts,
            tier: ModelTier::Capable,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Generate a draft with `generate`, then revise it into `range`.
    ///
    /// Fails with [`FableError::LengthConvergence`] carrying the last draft
    /// once `max_attempts` revisions have all missed the range.
    pub async fn rewrite<F, Fut>(&self, generate: F, range: CharRange) -> Result<String, FableError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, FableError>>,
    {
        let original = generate().await?;
        let mut draft = original.clone();
        let mut length = char_len(&draft);
        debug!(length, %range, "initial draft");
        if range.contains(length) {
            return Ok(draft);
        }

        let perspective = self.classify(&original).await?;
        debug!(%perspective, "classified point of view");

        for attempt in 1..=self.max_attempts {
            let prompt = revision_prompt(&original, &draft, length, range.lower(), perspective);
            draft = self.completion.complete_text(&prompt, self.tier).await?;
            length = char_len(&draft);
            debug!(attempt, length, %range, "revised draft");
            if range.contains(length) {
                info!(attempts = attempt, length, "draft fits target range");
                return Ok(draft);
            }
        }

        warn!(attempts = self.max_attempts, length, %range, "rewrite did not converge");
        Err(FableError::LengthConvergence {
            attempts: self.max_attempts,
            length,
            lower: range.lower(),
            upper: range.upper(),
            last_draft: draft,
        })
    }

    async fn classify(&self, passage: &str) -> Result<PointOfView, FableError> {
        let prompt = POINT_OF_VIEW_PROMPT.replace("{passage}", passage);
        let reply = self.completion.complete_text(&prompt, self.tier).await?;
        Ok(PointOfView::from_reply(&reply))
    }
}

fn revision_prompt(
    original: &str,
    draft: &str,
    length: usize,
    char_limit: usize,
    perspective: PointOfView,
) -> String {
    let num_char = length.to_string();
    let char_limit = char_limit.to_string();
    let perspective = perspective.to_string();
    fill(
        REVISION_PROMPT,
        &[
            ("passage", original),
            ("revision", draft),
            ("num_char", num_char.as_str()),
            ("char_limit", char_limit.as_str()),
            ("perspective", perspective.as_str()),
        ],
    )
}
