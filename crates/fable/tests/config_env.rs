// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading as the `fable` binary sees it: file plus `FABLE_*`
//! environment overrides. Tests touching the environment run serially.

use fable_core::ChatbotKind;
use serial_test::serial;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> std::path::PathBuf {
    let path = dir.path().join("fable.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

#[test]
#[serial]
fn file_values_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[memory]\nchatbot = \"summary_retrieval\"\n\n[persona]\nshort_target = 80\n",
    );

    let config = fable_config::load_and_validate_path(&path).unwrap();
    assert_eq!(config.memory.chatbot, ChatbotKind::SummaryRetrieval);
    assert_eq!(config.persona.short_target, 80);
    assert_eq!(config.persona.long_target, 500);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[memory]\nchatbot = \"retrieval\"\n");

    // SAFETY: serialized with every other test that reads the environment.
    unsafe { std::env::set_var("FABLE_MEMORY_CHATBOT", "generative") };
    let loaded = fable_config::load_and_validate_path(&path);
    unsafe { std::env::remove_var("FABLE_MEMORY_CHATBOT") };

    assert_eq!(loaded.unwrap().memory.chatbot, ChatbotKind::Generative);
}

#[test]
#[serial]
fn invalid_values_are_all_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[persona]\nshort_target = 1\n\n[memory]\ndecay_rate = 1.5\n",
    );

    let errors = fable_config::load_and_validate_path(&path).unwrap_err();
    assert!(errors.len() >= 2, "got: {errors:?}");
}
