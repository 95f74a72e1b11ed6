// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona generation for Fable.
//!
//! Turns rolling corpus summaries into a [`Persona`](fable_core::Persona):
//! two length-bounded first-person descriptions and a greeting. Personas,
//! summaries, and character lists are persisted as plain artifacts under
//! the corpus output directory.

pub mod cache;
pub mod characters;
pub mod generator;
pub mod rewriter;
pub mod summaries;

pub use cache::{PersonaCache, PersonaKey};
pub use characters::CharacterLister;
pub use generator::PersonaGenerator;
pub use rewriter::{CharRange, LengthConstrainedRewriter, PointOfView};
pub use summaries::{load_summaries, save_summaries};

use std::io::Write;
use std::path::Path;

use fable_core::FableError;

/// Helper to convert I/O errors into FableError::Storage.
pub(crate) fn storage_err(e: std::io::Error) -> FableError {
    FableError::Storage {
        source: Box::new(e),
    }
}

/// Write through a sibling temp file and rename into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FableError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(storage_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(contents).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// File-name form of a character name: parentheses and quotes become `-`,
/// spaces become `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace(['(', ')', '"'], "-").replace(' ', "_")
}
