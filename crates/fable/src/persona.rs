// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fable characters` and `fable persona` command implementations.

use std::sync::Arc;

use fable_config::model::{FableConfig, PersonaConfig};
use fable_core::{CompletionAdapter, FableError, Persona};
use fable_openai::OpenAiAdapter;
use fable_persona::{CharacterLister, PersonaCache, PersonaGenerator, PersonaKey};
use tracing::info;

use crate::corpus::CorpusPaths;

/// Lists a corpus's characters through the configured completion service.
pub async fn list_characters(
    config: &FableConfig,
    corpus: &str,
    force_refresh: bool,
) -> Result<Vec<String>, FableError> {
    let paths = CorpusPaths::new(&config.storage.output_dir, corpus);
    let summaries = paths.summaries().await?;
    let completion = Arc::new(OpenAiAdapter::new(&config.openai)?);
    CharacterLister::new(completion)
        .list_cached(
            paths.root(),
            &summaries,
            config.persona.num_characters,
            force_refresh,
        )
        .await
}

/// Loads a persona from cache, generating it with the configured completion
/// service when needed.
pub async fn load_persona(
    config: &FableConfig,
    corpus: &str,
    name: &str,
    force_refresh: bool,
) -> Result<Persona, FableError> {
    let completion: Arc<dyn CompletionAdapter> = Arc::new(OpenAiAdapter::new(&config.openai)?);
    let paths = CorpusPaths::new(&config.storage.output_dir, corpus);
    persona_with(completion, &config.persona, &paths, name, force_refresh).await
}

/// Cache-checked persona generation over an arbitrary completion service.
pub async fn persona_with(
    completion: Arc<dyn CompletionAdapter>,
    persona_config: &PersonaConfig,
    paths: &CorpusPaths,
    name: &str,
    force_refresh: bool,
) -> Result<Persona, FableError> {
    let summaries = paths.summaries().await?;
    let key = PersonaKey::new(
        &summaries,
        name,
        persona_config.short_target,
        persona_config.long_target,
    );
    let cache = PersonaCache::new(paths.personas_dir());
    let generator = PersonaGenerator::new(completion, persona_config)?;

    let persona = cache
        .get_or_generate(&key, force_refresh, || generator.generate(name, &summaries))
        .await?;
    info!(persona = %persona.name, path = %cache.path_for(&key).display(), "persona ready");
    Ok(persona)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_persona::save_summaries;
    use fable_test_utils::MockCompletion;

    fn scripted() -> Arc<MockCompletion> {
        Arc::new(
            MockCompletion::new()
                .when_contains("40-character description", "I am Nick, who loves lakes and soccer with Eliza.")
                .when_contains(
                    "400-character description",
                    "I am Nick. ".repeat(40).trim_end().to_string(),
                )
                .when_contains("Generate a greeting", "Hey there!"),
        )
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let out = tempfile::tempdir().unwrap();
        let paths = CorpusPaths::new(out.path(), "lake");
        save_summaries(&paths.summaries_dir(), &["Nick meets Eliza at the lake.".into()])
            .await
            .unwrap();

        let completion = scripted();
        let config = PersonaConfig::default();
        let first = persona_with(completion.clone(), &config, &paths, "Nick", false)
            .await
            .unwrap();
        let calls = completion.requests().await.len();
        let second = persona_with(completion.clone(), &config, &paths, "Nick", false)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(completion.requests().await.len(), calls);

        persona_with(completion.clone(), &config, &paths, "Nick", true)
            .await
            .unwrap();
        assert!(completion.requests().await.len() > calls);
    }
}
