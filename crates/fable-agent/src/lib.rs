// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue orchestration for Fable personas.
//!
//! [`Conversation`] drives a session: it asks the memory store for context,
//! assembles the in-character prompt, calls the completion service, and
//! records the exchange.

pub mod conversation;
pub mod prompt;

pub use conversation::Conversation;
pub use prompt::build_prompt;
