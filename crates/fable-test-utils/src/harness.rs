// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation testing.
//!
//! `TestHarness` wires a [`Conversation`] to mock completion and embedding
//! services and a manual clock, and exposes the mocks for assertions.

use std::sync::Arc;

use fable_agent::Conversation;
use fable_config::model::MemoryConfig;
use fable_core::{ChatbotKind, FableError, Persona};
use fable_memory::MemoryServices;

use crate::clock::ManualClock;
use crate::mock_completion::MockCompletion;
use crate::mock_embedder::MockEmbedder;

/// Default embedding width for harness conversations.
const DEFAULT_DIMENSION: usize = 16;

/// Builder for creating test conversations with configurable options.
pub struct TestHarnessBuilder {
    kind: ChatbotKind,
    persona: Persona,
    background: Vec<String>,
    memory: MemoryConfig,
    completion: Option<MockCompletion>,
    embedder: Option<MockEmbedder>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            kind: ChatbotKind::Summary,
            persona: sample_persona(),
            background: Vec::new(),
            memory: MemoryConfig::default(),
            completion: None,
            embedder: None,
        }
    }

    /// Select the chatbot flavour (and with it, the memory strategy).
    pub fn with_kind(mut self, kind: ChatbotKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Background texts seeded into memory before the first turn.
    pub fn with_background<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.background = texts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Queue replies on a fresh mock completion service.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.completion = Some(MockCompletion::with_responses(responses));
        self
    }

    /// Use a pre-configured mock completion service.
    pub fn with_completion(mut self, completion: MockCompletion) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the conversation, seeding memory with the background texts.
    pub async fn build(self) -> Result<TestHarness, FableError> {
        let completion = Arc::new(self.completion.unwrap_or_default());
        let embedder = Arc::new(
            self.embedder
                .unwrap_or_else(|| MockEmbedder::new(DEFAULT_DIMENSION)),
        );
        let clock = Arc::new(ManualClock::fixed());

        let services = MemoryServices {
            completion: completion.clone(),
            embedder: embedder.clone(),
            clock: clock.clone(),
        };
        let conversation = Conversation::new(
            self.persona,
            self.kind,
            &self.memory,
            services,
            self.background,
        )
        .await?;

        Ok(TestHarness {
            conversation,
            completion,
            embedder,
            clock,
        })
    }
}

/// A conversation backed entirely by mocks.
pub struct TestHarness {
    /// The conversation under test.
    pub conversation: Conversation,
    /// The mock completion service.
    pub completion: Arc<MockCompletion>,
    /// The mock embedding service.
    pub embedder: Arc<MockEmbedder>,
    /// The clock shared by the memory store.
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one turn and return the agent's reply.
    pub async fn send_message(&mut self, text: &str) -> Result<String, FableError> {
        self.conversation.step(text).await
    }
}

/// A small persona for tests that don't care about its content.
pub fn sample_persona() -> Persona {
    Persona {
        name: "Nick".into(),
        short_description: "I am Nick, who loves lakes and soccer with Eliza.".into(),
        long_description: "I am Nick. I spend my summers at the lake with Eliza, \
                           and on weekends we go to soccer games together."
            .into(),
        greeting: "Hey there, I'm Nick!".into(),
    }
}
