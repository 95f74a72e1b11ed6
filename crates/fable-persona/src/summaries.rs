// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling-summary artifacts: one `summary_<i>.txt` per reduction step.

use std::path::Path;

use fable_core::FableError;
use tracing::debug;

use crate::storage_err;

const PREFIX: &str = "summary_";
const SUFFIX: &str = ".txt";

fn file_name(index: usize) -> String {
    format!("{PREFIX}{index}{SUFFIX}")
}

fn parse_index(name: &str) -> Option<usize> {
    name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?.parse().ok()
}

/// Write `summaries` to `dir` in order, creating the directory if needed.
pub async fn save_summaries(dir: &Path, summaries: &[String]) -> Result<(), FableError> {
    tokio::fs::create_dir_all(dir).await.map_err(storage_err)?;
    for (i, summary) in summaries.iter().enumerate() {
        tokio::fs::write(dir.join(file_name(i)), summary)
            .await
            .map_err(storage_err)?;
    }
    debug!(dir = %dir.display(), count = summaries.len(), "saved summaries");
    Ok(())
}

/// Read summaries back in numeric index order.
///
/// Indices must run contiguously from zero; any other file in the
/// directory, or a gap, means the artifact set is corrupt.
pub async fn load_summaries(dir: &Path) -> Result<Vec<String>, FableError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(storage_err)?;
    let mut indexed = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(storage_err)? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let index = parse_index(&name).ok_or_else(|| FableError::CacheCorruption {
            path: entry.path(),
            message: "unexpected file in summaries directory".into(),
        })?;
        indexed.push((index, entry.path()));
    }
    indexed.sort_by_key(|(index, _)| *index);

    let mut summaries = Vec::with_capacity(indexed.len());
    for (expected, (index, path)) in indexed.into_iter().enumerate() {
        if index != expected {
            return Err(FableError::CacheCorruption {
                path: dir.join(file_name(expected)),
                message: format!("summary {expected} is missing"),
            });
        }
        summaries.push(tokio::fs::read_to_string(&path).await.map_err(storage_err)?);
    }
    debug!(dir = %dir.display(), count = summaries.len(), "loaded summaries");
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        let summaries: Vec<String> = (0..12).map(|i| format!("summary number {i}")).collect();
        save_summaries(dir.path(), &summaries).await.unwrap();

        let loaded = load_summaries(dir.path()).await.unwrap();
        assert_eq!(loaded, summaries);
    }

    #[tokio::test]
    async fn gap_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        save_summaries(dir.path(), &["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        std::fs::remove_file(dir.path().join("summary_1.txt")).unwrap();

        let err = load_summaries(dir.path()).await.unwrap_err();
        assert!(matches!(err, FableError::CacheCorruption { .. }));
        assert!(err.to_string().contains("summary 1 is missing"));
    }

    #[tokio::test]
    async fn stray_file_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        save_summaries(dir.path(), &["a".into()]).await.unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();
        assert!(matches!(
            load_summaries(dir.path()).await,
            Err(FableError::CacheCorruption { .. })
        ));
    }

    #[tokio::test]
    async fn missing_directory_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_summaries(&dir.path().join("absent")).await.unwrap_err();
        assert_eq!(err.kind(), "storage");
    }
}
