// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of a corpus and summary import.

use std::path::{Path, PathBuf};

use fable_core::FableError;
use fable_persona::{load_summaries, save_summaries};

/// Separator line between summaries in an import file.
const SUMMARY_SEPARATOR: &str = "---";

/// Artifact locations for one corpus under the output directory.
#[derive(Debug, Clone)]
pub struct CorpusPaths {
    root: PathBuf,
}

impl CorpusPaths {
    pub fn new(output_dir: &Path, corpus: &str) -> Self {
        Self {
            root: output_dir.join(fable_persona::sanitize_file_name(corpus)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.root.join("summaries")
    }

    pub fn personas_dir(&self) -> PathBuf {
        self.root.join("personas")
    }

    /// The corpus's rolling summaries, in order.
    pub async fn summaries(&self) -> Result<Vec<String>, FableError> {
        let dir = self.summaries_dir();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(FableError::Config(format!(
                "no summaries at {}; run `fable import` first",
                dir.display()
            )));
        }
        load_summaries(&dir).await
    }
}

/// Split an import file into summaries on `---` separator lines.
pub fn parse_summary_file(text: &str) -> Vec<String> {
    let mut summaries = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim() == SUMMARY_SEPARATOR {
            summaries.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    summaries.push(current.join("\n"));
    summaries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Copy summaries from `file` into the corpus's summary artifacts.
pub async fn import_summaries(paths: &CorpusPaths, file: &Path) -> Result<usize, FableError> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| FableError::Storage {
            source: Box::new(e),
        })?;
    let summaries = parse_summary_file(&text);
    if summaries.is_empty() {
        return Err(FableError::Config(format!(
            "{} contains no summaries",
            file.display()
        )));
    }
    let dir = paths.summaries_dir();
    if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        return Err(FableError::Config(format!(
            "summaries already exist at {}; remove them to re-import",
            dir.display()
        )));
    }
    save_summaries(&dir, &summaries).await?;
    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_separator_lines() {
        let text = "Nick meets Eliza at the lake.\n---\nNick and Eliza go to a soccer game.\nThey win.\n---\n\n";
        assert_eq!(
            parse_summary_file(text),
            vec![
                "Nick meets Eliza at the lake.".to_string(),
                "Nick and Eliza go to a soccer game.\nThey win.".to_string(),
            ]
        );
    }

    #[test]
    fn corpus_name_is_sanitized() {
        let paths = CorpusPaths::new(Path::new("/tmp/out"), "The Great Gatsby");
        assert_eq!(paths.root(), Path::new("/tmp/out/The_Great_Gatsby"));
        assert_eq!(paths.summaries_dir(), Path::new("/tmp/out/The_Great_Gatsby/summaries"));
    }

    #[tokio::test]
    async fn import_then_load() {
        let out = tempfile::tempdir().unwrap();
        let file = out.path().join("summaries.txt");
        std::fs::write(&file, "one\n---\ntwo\n---\nthree").unwrap();
        let paths = CorpusPaths::new(out.path(), "tiny");

        assert_eq!(import_summaries(&paths, &file).await.unwrap(), 3);
        assert_eq!(paths.summaries().await.unwrap(), vec!["one", "two", "three"]);

        let err = import_summaries(&paths, &file).await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[tokio::test]
    async fn missing_summaries_point_at_import() {
        let out = tempfile::tempdir().unwrap();
        let err = CorpusPaths::new(out.path(), "absent")
            .summaries()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fable import"));
    }
}
