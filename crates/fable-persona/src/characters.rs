// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Character listing for a corpus.
//!
//! A listed cast is cached next to the corpus under a name derived from the
//! schema version, the corpus digest and the requested count, so a changed
//! corpus or a different `n` never reuses an old list.

use std::path::Path;
use std::sync::Arc;

use fable_core::{CompletionAdapter, FableError, ModelTier};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::{CACHE_SCHEMA_VERSION, KEY_PREFIX_LEN, corpus_digest};
use crate::{storage_err, write_atomic};

/// `characters-<key prefix>.v<schema>.json` for this corpus and count.
pub fn characters_file_name(summaries: &[String], n: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CACHE_SCHEMA_VERSION.to_le_bytes());
    hasher.update(corpus_digest(summaries).as_bytes());
    hasher.update((n as u64).to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!(
        "characters-{}.v{CACHE_SCHEMA_VERSION}.json",
        &digest[..KEY_PREFIX_LEN]
    )
}

const CHARACTERS_PROMPT: &str = "Consider the following corpus.
---
{corpus_summaries}
---
Give a line-separated list of all the characters, ordered by importance, without punctuation.";

/// Asks the capable tier who appears in a corpus.
pub struct CharacterLister {
    completion: Arc<dyn CompletionAdapter>,
}

impl CharacterLister {
    pub fn new(completion: Arc<dyn CompletionAdapter>) -> Self {
        Self { completion }
    }

    /// The `n` most important characters, most important first.
    pub async fn list(&self, summaries: &[String], n: usize) -> Result<Vec<String>, FableError> {
        let prompt = CHARACTERS_PROMPT.replace("{corpus_summaries}", &summaries.join("\n\n"));
        let reply = self
            .completion
            .complete_text(&prompt, ModelTier::Capable)
            .await?;
        let names = parse_names(&reply, n);
        info!(count = names.len(), "listed characters");
        Ok(names)
    }

    /// [`list`](Self::list), memoized in `dir` under
    /// [`characters_file_name`]. A file that fails to parse is reported as
    /// corruption and left in place.
    pub async fn list_cached(
        &self,
        dir: &Path,
        summaries: &[String],
        n: usize,
        force_refresh: bool,
    ) -> Result<Vec<String>, FableError> {
        let path = dir.join(characters_file_name(summaries, n));
        if !force_refresh {
            match tokio::fs::read_to_string(&path).await {
                Ok(raw) => {
                    debug!(path = %path.display(), "characters cache hit");
                    return serde_json::from_str(&raw).map_err(|e| FableError::CacheCorruption {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(storage_err(e)),
            }
        }

        let names = self.list(summaries, n).await?;
        let json = serde_json::to_string_pretty(&names)
            .map_err(|e| FableError::Internal(e.to_string()))?;
        write_atomic(&path, json.as_bytes())?;
        Ok(names)
    }
}

/// First `n` non-empty lines, with list markers and stray punctuation removed.
pub fn parse_names(reply: &str, n: usize) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | ')'))
                .replace(['(', ')', '"'], "")
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty())
        .take(n)
        .collect()
}
