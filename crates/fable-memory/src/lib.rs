// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational memory for Fable personas.
//!
//! ## Strategies
//!
//! - **BufferMemory**: transcript only, no retrieval
//! - **VectorRetrievalMemory**: exact nearest-neighbour retrieval over
//!   background texts and (optionally) past turns
//! - **TimeWeightedMemory**: similarity + recency + importance, with a
//!   [`ReflectionEngine`] that turns accumulated memories into insights
//!
//! [`MemoryStore`] wraps exactly one of these for the lifetime of a session.

pub mod buffer;
pub mod generative;
pub mod importance;
pub mod index;
pub mod reflection;
pub mod retrieval;
pub mod store;
pub mod stream;
pub mod types;

pub use buffer::{BufferMemory, TranscriptBuffer};
pub use generative::TimeWeightedMemory;
pub use importance::ImportanceRater;
pub use index::VectorIndex;
pub use reflection::{ReflectionEngine, ReflectionPass, ReflectionState};
pub use retrieval::VectorRetrievalMemory;
pub use store::{MemoryServices, MemoryStore};
pub use stream::MemoryStream;
pub use types::*;
