// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona generation from rolling corpus summaries.

use std::sync::Arc;

use fable_config::model::PersonaConfig;
use fable_core::template::fill;
use fable_core::{CompletionAdapter, FableError, ModelTier, Persona};
use tracing::info;

use crate::rewriter::{CharRange, LengthConstrainedRewriter};

/// Instructions framing the description request.
const DESCRIPTION_SYSTEM_PROMPT: &str = "You are a chatbot designer that specializes in translating stories into chatbot descriptions.
You are an expert a theory of mind.
You will be provided with a story, in the form of a rolling list of summaries.
Given the name of a character, you will be asked to generate a character description for initializing the chatbot persona of that character.
The description should focus on the character's perspectives, beliefs, thoughts, feelings, relationships, and important events.
The description should be as faithful to the story as possible.";

const DESCRIPTION_PROMPT: &str = "Here is the rolling list of summaries:
---
{rolling_summaries}
---
Provide {description} of {name} that will be used to initialize a chatbot persona of that character.
The description should be written in first-person, as if the chatbot is describing themselves.
The description should not reference the fact that the character is in a story or that the character is a chatbot.
The character should believe that they are a real person.";

const GREETING_PROMPT: &str = "Here are a short and long description for a character named {name}:

Short description:
---
{short_description}
---

Long description:
---
{long_description}
---

Generate a greeting that {name} would say to someone they just met, without quotations.
This greeting should reflect their personality.";

/// Builds a [`Persona`] for a named character.
pub struct PersonaGenerator {
    completion: Arc<dyn CompletionAdapter>,
    rewriter: LengthConstrainedRewriter,
    short_range: CharRange,
    long_range: CharRange,
}

impl PersonaGenerator {
    pub fn new(
        completion: Arc<dyn CompletionAdapter>,
        config: &PersonaConfig,
    ) -> Result<Self, FableError> {
        Ok(Self {
            rewriter: LengthConstrainedRewriter::new(
                completion.clone(),
                config.max_rewrite_attempts,
            ),
            completion,
            short_range: CharRange::for_target(config.short_target)?,
            long_range: CharRange::for_target(config.long_target)?,
        })
    }

    pub fn short_range(&self) -> CharRange {
        self.short_range
    }

    pub fn long_range(&self) -> CharRange {
        self.long_range
    }

    /// Generate both descriptions and a greeting.
    pub async fn generate(&self, name: &str, summaries: &[String]) -> Result<Persona, FableError> {
        info!(persona = name, summaries = summaries.len(), "generating persona");
        let short_description = self.describe(name, summaries, self.short_range).await?;
        let long_description = self.describe(name, summaries, self.long_range).await?;
        let greeting = self
            .greet(name, &short_description, &long_description)
            .await?;
        info!(persona = name, "persona generated");
        Ok(Persona {
            name: name.to_string(),
            short_description,
            long_description,
            greeting,
        })
    }

    /// A first-person description whose length lies in `range`.
    pub async fn describe(
        &self,
        name: &str,
        summaries: &[String],
        range: CharRange,
    ) -> Result<String, FableError> {
        let prompt = description_prompt(name, summaries, range.lower());
        self.rewriter
            .rewrite(
                || self.completion.complete_text(&prompt, ModelTier::Capable),
                range,
            )
            .await
    }

    /// One greeting call; quotation marks are stripped from the reply.
    pub async fn greet(
        &self,
        name: &str,
        short_description: &str,
        long_description: &str,
    ) -> Result<String, FableError> {
        let prompt = fill(
            GREETING_PROMPT,
            &[
                ("short_description", short_description),
                ("long_description", long_description),
                ("name", name),
            ],
        );
        let reply = self
            .completion
            .complete_text(&prompt, ModelTier::Fast)
            .await?;
        Ok(reply.replace('"', "").trim().to_string())
    }
}

fn description_prompt(name: &str, summaries: &[String], lower: usize) -> String {
    let rolling_summaries = summaries.join("\n\n");
    let description = format!("{lower}-character description");
    let request = fill(
        DESCRIPTION_PROMPT,
        &[
            ("rolling_summaries", rolling_summaries.as_str()),
            ("description", description.as_str()),
            ("name", name),
        ],
    );
    format!("{DESCRIPTION_SYSTEM_PROMPT}\n\n{request}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_test_utils::MockCompletion;

    fn summaries() -> Vec<String> {
        vec![
            "Nick meets Eliza at the lake.".to_string(),
            "Nick and Eliza go to a soccer game.".to_string(),
        ]
    }

    fn scripted() -> Arc<MockCompletion> {
        Arc::new(
            MockCompletion::new()
                .when_contains("40-character description", "I am Nick, a lakeside dreamer.")
                .when_contains(
                    "400-character description",
                    "I am Nick. ".repeat(40).trim_end().to_string(),
                )
                .when_contains("Generate a greeting", "\"Hey there, I'm Nick!\"")
                .when_contains("What point of view", "first person")
                .when_contains(
                    "Your previous revision",
                    "I am Nick, who loves lakes and soccer with Eliza.",
                ),
        )
    }

    #[test]
    fn description_prompt_uses_lower_bound() {
        let prompt = description_prompt("Nick", &summaries(), 40);
        assert!(prompt.starts_with("You are a chatbot designer"));
        assert!(prompt.contains(
            "---\nNick meets Eliza at the lake.\n\nNick and Eliza go to a soccer game.\n---"
        ));
        assert!(prompt.contains("Provide 40-character description of Nick"));
    }

    #[test]
    fn ranges_follow_targets() {
        let generator =
            PersonaGenerator::new(Arc::new(MockCompletion::new()), &PersonaConfig::default())
                .unwrap();
        assert_eq!(generator.short_range(), CharRange::new(40, 50).unwrap());
        assert_eq!(generator.long_range(), CharRange::new(400, 500).unwrap());
    }

    #[tokio::test]
    async fn generates_bounded_persona() {
        let completion = scripted();
        let generator = PersonaGenerator::new(completion.clone(), &PersonaConfig::default()).unwrap();
        let persona = generator.generate("Nick", &summaries()).await.unwrap();

        assert_eq!(persona.name, "Nick");
        assert_eq!(persona.short_description, "I am Nick, who loves lakes and soccer with Eliza.");
        assert!(generator.short_range().contains(persona.short_description.chars().count()));
        assert!(generator.long_range().contains(persona.long_description.chars().count()));
        assert_eq!(persona.greeting, "Hey there, I'm Nick!");

        let greeting_request = completion
            .requests()
            .await
            .into_iter()
            .find(|r| r.prompt.contains("Generate a greeting"))
            .unwrap();
        assert_eq!(greeting_request.tier, ModelTier::Fast);
        assert!(greeting_request.prompt.contains("Short description:\n---\nI am Nick, who loves"));
    }

    #[tokio::test]
    async fn convergence_failure_surfaces() {
        let completion = Arc::new(
            MockCompletion::new()
                .when_contains("What point of view", "first person")
                .when_contains("character description", "far too short"),
        );
        let config = PersonaConfig {
            max_rewrite_attempts: 2,
            ..PersonaConfig::default()
        };
        let generator = PersonaGenerator::new(completion, &config).unwrap();
        let err = generator.generate("Nick", &summaries()).await.unwrap_err();
        assert!(matches!(err, FableError::LengthConvergence { attempts: 2, .. }));
    }

    #[test]
    fn tiny_target_is_rejected() {
        let config = PersonaConfig {
            short_target: 0,
            ..PersonaConfig::default()
        };
        assert!(matches!(
            PersonaGenerator::new(Arc::new(MockCompletion::new()), &config),
            Err(FableError::Config(_))
        ));
    }
}
