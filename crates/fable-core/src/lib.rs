// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fable persona engine.
//!
//! This crate provides the error type, the completion and embedding adapter
//! traits, and the types shared by the memory, persona, and dialogue crates.
//! External services are always passed in as explicit trait objects.

pub mod clock;
pub mod error;
pub mod template;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::FableError;
pub use types::{
    AdapterType, ChatbotKind, CompletionRequest, CompletionResponse, ConversationTurn,
    EmbeddingInput, EmbeddingOutput, HealthStatus, ModelTier, Persona, Role,
};

pub use traits::{CompletionAdapter, EmbeddingAdapter, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_distinct() {
        let errors = [
            FableError::Config("test".into()),
            FableError::LengthConvergence {
                attempts: 10,
                length: 120,
                lower: 40,
                upper: 50,
                last_draft: "draft".into(),
            },
            FableError::Completion {
                message: "test".into(),
                source: None,
            },
            FableError::Embedding {
                message: "test".into(),
                source: None,
            },
            FableError::CacheCorruption {
                path: "persona.json".into(),
                message: "truncated".into(),
            },
            FableError::Storage {
                source: Box::new(std::io::Error::other("test")),
            },
            FableError::Internal("test".into()),
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn length_convergence_message_names_bounds() {
        let err = FableError::LengthConvergence {
            attempts: 10,
            length: 73,
            lower: 40,
            upper: 50,
            last_draft: "x".repeat(73),
        };
        let msg = err.to_string();
        assert!(msg.contains("[40, 50]"), "got: {msg}");
        assert!(msg.contains("73 characters"), "got: {msg}");
        assert!(!err.is_fatal());
    }

    #[test]
    fn chatbot_kind_parses_closed_set() {
        assert_eq!(ChatbotKind::parse("summary").unwrap(), ChatbotKind::Summary);
        assert_eq!(
            ChatbotKind::parse("retrieval").unwrap(),
            ChatbotKind::Retrieval
        );
        assert_eq!(
            ChatbotKind::parse("summary_retrieval").unwrap(),
            ChatbotKind::SummaryRetrieval
        );
        assert_eq!(
            ChatbotKind::parse(" generative ").unwrap(),
            ChatbotKind::Generative
        );
    }

    #[test]
    fn unknown_chatbot_kind_is_config_error() {
        let err = ChatbotKind::parse("telepathic").unwrap_err();
        assert!(matches!(err, FableError::Config(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("summary_retrieval"));
    }

    #[test]
    fn chatbot_kind_serde_matches_display() {
        let json = serde_json::to_string(&ChatbotKind::SummaryRetrieval).unwrap();
        assert_eq!(json, "\"summary_retrieval\"");
        assert_eq!(ChatbotKind::SummaryRetrieval.to_string(), "summary_retrieval");
    }

    #[test]
    fn persona_rejects_extra_fields() {
        let json = r#"{"name":"Nick","short_description":"s","long_description":"l","greeting":"hi","mood":"x"}"#;
        assert!(serde_json::from_str::<Persona>(json).is_err());
    }

    #[test]
    fn model_tier_display() {
        assert_eq!(ModelTier::Fast.to_string(), "fast");
        assert_eq!(ModelTier::Capable.to_string(), "capable");
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_completion_adapter<T: CompletionAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
    }
}
