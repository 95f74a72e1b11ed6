// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript buffering and the buffer-only memory strategy.

use tracing::debug;

use crate::types::ContextWindow;

/// Speaker label used for the human side of a conversation.
pub const USER_PREFIX: &str = "Human";

/// Ordered user/agent exchanges rendered as `Speaker: text` lines.
#[derive(Debug, Clone)]
pub struct TranscriptBuffer {
    agent_name: String,
    turns: Vec<(String, String)>,
}

impl TranscriptBuffer {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            turns: Vec::new(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn push(&mut self, user_text: &str, agent_text: &str) {
        self.turns
            .push((user_text.to_string(), agent_text.to_string()));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render one exchange, as stored in retrieval memories.
    pub fn render_turn(&self, user_text: &str, agent_text: &str) -> String {
        format!(
            "{USER_PREFIX}: {user_text}\n{}: {agent_text}",
            self.agent_name
        )
    }

    /// Render every exchange, oldest first.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|(user, agent)| self.render_turn(user, agent))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Memory that keeps only the transcript. Nothing is embedded or retrieved.
#[derive(Debug, Clone)]
pub struct BufferMemory {
    transcript: TranscriptBuffer,
}

impl BufferMemory {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            transcript: TranscriptBuffer::new(agent_name),
        }
    }

    /// Background texts have no place in a buffer-only prompt; they are dropped.
    pub fn record_background(&mut self, texts: &[String]) {
        debug!(count = texts.len(), "buffer memory ignores background texts");
    }

    pub fn record_turn(&mut self, user_text: &str, agent_text: &str) {
        self.transcript.push(user_text, agent_text);
    }

    pub fn build_context(&self) -> ContextWindow {
        ContextWindow {
            transcript: self.transcript.render(),
            retrieved: String::new(),
        }
    }

    pub fn transcript(&self) -> &TranscriptBuffer {
        &self.transcript
    }
}
