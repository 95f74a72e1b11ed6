// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Fable integration tests.
//!
//! Provides mock services and a test harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockCompletion`] - Mock completion service with scripted and rule-based replies
//! - [`MockEmbedder`] - Deterministic bag-of-words embedder
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Conversation wired to all of the above

pub mod clock;
pub mod harness;
pub mod mock_completion;
pub mod mock_embedder;

pub use clock::ManualClock;
pub use harness::{TestHarness, sample_persona};
pub use mock_completion::MockCompletion;
pub use mock_embedder::MockEmbedder;
