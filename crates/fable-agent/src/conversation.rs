// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-character dialogue over one memory store.
//!
//! A conversation owns the persona, the memory store chosen at construction,
//! and the transcript. Turns are processed one at a time: context build,
//! completion call, store update.

use fable_config::model::MemoryConfig;
use fable_core::{
    ChatbotKind, CompletionAdapter, ConversationTurn, FableError, ModelTier, Persona, Role,
};
use fable_memory::{MemoryServices, MemoryStore};
use tracing::{debug, info};

use crate::prompt::build_prompt;

pub struct Conversation {
    session_id: String,
    persona: Persona,
    kind: ChatbotKind,
    memory_config: MemoryConfig,
    services: MemoryServices,
    background: Vec<String>,
    store: MemoryStore,
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// Build the memory store for `kind`, seed it with `background`, and open
    /// the transcript with the persona's greeting.
    pub async fn new(
        persona: Persona,
        kind: ChatbotKind,
        memory_config: &MemoryConfig,
        services: MemoryServices,
        background: Vec<String>,
    ) -> Result<Self, FableError> {
        let store = seeded_store(kind, &persona.name, memory_config, &services, &background).await?;
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            persona = %persona.name,
            chatbot = %kind,
            strategy = store.strategy(),
            background = background.len(),
            "conversation started"
        );
        let turns = vec![greeting_turn(&persona)];
        Ok(Self {
            session_id,
            persona,
            kind,
            memory_config: memory_config.clone(),
            services,
            background,
            store,
            turns,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn kind(&self) -> ChatbotKind {
        self.kind
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// The persona's greeting, verbatim. Always the first transcript entry.
    pub fn greet(&self) -> &str {
        &self.persona.greeting
    }

    /// Every turn so far, greeting first, with contiguous sequence numbers.
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Produce the agent's reply to `user_text`.
    ///
    /// A failed completion leaves the transcript and store untouched. Once a
    /// reply exists it is appended to the transcript before the store records
    /// it, so a store failure is reported without losing the exchange.
    pub async fn step(&mut self, user_text: &str) -> Result<String, FableError> {
        let context = self.store.build_context(user_text).await?;
        let prompt = build_prompt(self.kind, &self.persona, &context, user_text);
        debug!(
            session_id = %self.session_id,
            prompt_chars = prompt.len(),
            retrieved_chars = context.retrieved.len(),
            "assembled dialogue prompt"
        );

        let reply = self.completion().complete_text(&prompt, ModelTier::Fast).await?;
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(FableError::Completion {
                message: "completion service returned an empty reply".into(),
                source: None,
            });
        }

        self.push(Role::User, user_text);
        self.push(Role::Agent, &reply);
        self.store.record_turn(user_text, &reply).await?;
        debug!(session_id = %self.session_id, turns = self.turns.len(), "turn recorded");
        Ok(reply)
    }

    /// Start over: transcript back to the greeting, memory rebuilt from the
    /// original background texts.
    pub async fn clear(&mut self) -> Result<(), FableError> {
        self.store = seeded_store(
            self.kind,
            &self.persona.name,
            &self.memory_config,
            &self.services,
            &self.background,
        )
        .await?;
        self.turns = vec![greeting_turn(&self.persona)];
        info!(session_id = %self.session_id, "conversation cleared");
        Ok(())
    }

    fn completion(&self) -> &dyn CompletionAdapter {
        self.services.completion.as_ref()
    }

    fn push(&mut self, role: Role, content: &str) {
        let sequence = self.turns.len();
        self.turns.push(ConversationTurn {
            role,
            content: content.to_string(),
            sequence,
        });
    }
}

fn greeting_turn(persona: &Persona) -> ConversationTurn {
    ConversationTurn {
        role: Role::Agent,
        content: persona.greeting.clone(),
        sequence: 0,
    }
}

async fn seeded_store(
    kind: ChatbotKind,
    agent_name: &str,
    config: &MemoryConfig,
    services: &MemoryServices,
    background: &[String],
) -> Result<MemoryStore, FableError> {
    let mut store = MemoryStore::for_kind(kind, agent_name, config, services.clone());
    store.record_background(background).await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fable_test_utils::{ManualClock, MockCompletion, MockEmbedder};

    fn nick() -> Persona {
        Persona {
            name: "Nick".into(),
            short_description: "I am Nick.".into(),
            long_description: "I am Nick, a bond salesman from the Midwest.".into(),
            greeting: "Hey there, I'm Nick!".into(),
        }
    }

    fn background() -> Vec<String> {
        vec![
            "Nick meets Eliza at the lake.".to_string(),
            "Nick and Eliza go to a soccer game.".to_string(),
        ]
    }

    fn services(completion: &Arc<MockCompletion>) -> MemoryServices {
        MemoryServices {
            completion: completion.clone(),
            embedder: Arc::new(MockEmbedder::new(16)),
            clock: Arc::new(ManualClock::fixed()),
        }
    }

    async fn conversation(kind: ChatbotKind, completion: &Arc<MockCompletion>) -> Conversation {
        Conversation::new(
            nick(),
            kind,
            &MemoryConfig::default(),
            services(completion),
            background(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn greeting_opens_transcript() {
        let completion = Arc::new(MockCompletion::new());
        let convo = conversation(ChatbotKind::Summary, &completion).await;
        assert_eq!(convo.greet(), "Hey there, I'm Nick!");
        assert_eq!(
            convo.transcript(),
            &[ConversationTurn {
                role: Role::Agent,
                content: "Hey there, I'm Nick!".into(),
                sequence: 0,
            }]
        );
        assert!(completion.requests().await.is_empty());
    }

    #[tokio::test]
    async fn steps_extend_transcript_contiguously() {
        let completion = Arc::new(MockCompletion::with_responses(["  Doing well.  ", "Eliza is a friend."]));
        let mut convo = conversation(ChatbotKind::Summary, &completion).await;

        assert_eq!(convo.step("How are you?").await.unwrap(), "Doing well.");
        assert_eq!(convo.step("Who is Eliza?").await.unwrap(), "Eliza is a friend.");

        let turns = convo.transcript();
        assert_eq!(turns.len(), 5);
        for (i, turn) in turns.iter().enumerate() {
            assert_eq!(turn.sequence, i);
        }
        assert_eq!(turns[3].role, Role::User);
        assert_eq!(turns[3].content, "Who is Eliza?");

        let prompts = completion.prompts().await;
        assert!(prompts[1].contains(
            "Nick: Hey there, I'm Nick!\nHuman: How are you?\nNick: Doing well.\n---\n\nHuman: Who is Eliza?\nNick:"
        ));
        let requests = completion.requests().await;
        assert!(requests.iter().all(|r| r.tier == ModelTier::Fast));
    }

    #[tokio::test]
    async fn retrieved_context_reaches_prompt() {
        let completion = Arc::new(MockCompletion::with_responses(["She's lovely."]));
        let mut convo = conversation(ChatbotKind::Retrieval, &completion).await;
        convo.step("Tell me about Eliza").await.unwrap();

        let prompt = &completion.prompts().await[0];
        assert!(prompt.contains("Story snippets for context:"));
        assert!(prompt.contains("Nick meets Eliza at the lake."));
        assert!(prompt.contains("Nick and Eliza go to a soccer game."));
        assert_eq!(convo.store().record_count(), 3);
    }

    #[tokio::test]
    async fn completion_failure_leaves_state_untouched() {
        let completion = Arc::new(MockCompletion::failing("rate limited"));
        let mut convo = conversation(ChatbotKind::Retrieval, &completion).await;
        let err = convo.step("Hello").await.unwrap_err();
        assert!(matches!(err, FableError::Completion { .. }));
        assert_eq!(convo.transcript().len(), 1);
        assert_eq!(convo.store().record_count(), 2);
    }

    #[tokio::test]
    async fn failed_memory_write_keeps_prompt_history_in_step() {
        let completion = Arc::new(MockCompletion::with_responses(["Hi!", "Still here."]));
        let embedder = MockEmbedder::new(16).with_vector("Human: Hello\nNick: Hi!", vec![1.0]);
        let mut convo = Conversation::new(
            nick(),
            ChatbotKind::Retrieval,
            &MemoryConfig::default(),
            MemoryServices {
                embedder: Arc::new(embedder),
                ..services(&completion)
            },
            background(),
        )
        .await
        .unwrap();

        let err = convo.step("Hello").await.unwrap_err();
        assert_eq!(err.kind(), "embedding");
        assert_eq!(convo.transcript().len(), 3);

        convo.step("Are you there?").await.unwrap();
        let prompt = &completion.prompts().await[1];
        assert!(prompt.contains("Nick: Hey there, I'm Nick!\nHuman: Hello\nNick: Hi!\n"));
        assert_eq!(convo.transcript().len(), 5);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let completion = Arc::new(MockCompletion::with_responses(["   "]));
        let mut convo = conversation(ChatbotKind::Summary, &completion).await;
        let err = convo.step("Hello").await.unwrap_err();
        assert_eq!(err.kind(), "completion");
        assert_eq!(convo.transcript().len(), 1);
    }

    #[tokio::test]
    async fn clear_rebuilds_from_background() {
        let completion = Arc::new(MockCompletion::with_responses(["Hi!", "Hello again."]));
        let mut convo = conversation(ChatbotKind::Retrieval, &completion).await;
        convo.step("Hello").await.unwrap();
        assert_eq!(convo.store().record_count(), 3);

        convo.clear().await.unwrap();
        assert_eq!(convo.transcript().len(), 1);
        assert_eq!(convo.store().record_count(), 2);

        convo.step("Hello").await.unwrap();
        let prompt = &completion.prompts().await[1];
        assert!(!prompt.contains("Human: Hello\nNick: Hi!"));
    }

    #[tokio::test]
    async fn kind_is_fixed_for_the_session() {
        let completion = Arc::new(MockCompletion::new().when_contains("poignancy", "1"));
        let mut convo = conversation(ChatbotKind::Generative, &completion).await;
        convo.clear().await.unwrap();
        assert_eq!(convo.kind(), ChatbotKind::Generative);
        assert_eq!(convo.store().strategy(), "time_weighted_reflective");
    }
}
