// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion adapter for deterministic testing.
//!
//! `MockCompletion` answers from prompt-matching rules first, then from a
//! FIFO queue, then with a default text. Every request is recorded so tests
//! can assert on the prompts a component produced.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use fable_core::traits::{CompletionAdapter, PluginAdapter};
use fable_core::types::{AdapterType, CompletionRequest, CompletionResponse, HealthStatus};
use fable_core::FableError;

type Rule = Box<dyn Fn(&CompletionRequest) -> Option<String> + Send + Sync>;

/// A mock completion service with scripted responses.
pub struct MockCompletion {
    rules: Vec<Rule>,
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    failure: Option<String>,
}

impl MockCompletion {
    /// Create a mock with no rules and an empty queue.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Create a mock pre-loaded with queued responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        let queue: VecDeque<String> = responses.into_iter().map(Into::into).collect();
        Self {
            responses: Arc::new(Mutex::new(queue)),
            ..mock
        }
    }

    /// Create a mock whose every call fails with a completion error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Answer any prompt containing `needle` with `reply`. Rules are checked in
    /// insertion order before the queue.
    pub fn when_contains(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        let needle = needle.into();
        let reply = reply.into();
        self.with_rule(move |req| req.prompt.contains(&needle).then(|| reply.clone()))
    }

    /// Add an arbitrary responder rule.
    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Option<String> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append a response to the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Prompts of the requests received so far.
    pub async fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    /// Number of requests whose prompt contains `needle`.
    pub async fn count_containing(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.prompt.contains(needle))
            .count()
    }

    async fn next_response(&self, request: &CompletionRequest) -> String {
        if let Some(reply) = self.rules.iter().find_map(|rule| rule(request)) {
            return reply;
        }
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, FableError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionAdapter for MockCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, FableError> {
        self.requests.lock().await.push(request.clone());

        if let Some(message) = &self.failure {
            return Err(FableError::Completion {
                message: message.clone(),
                source: None,
            });
        }

        let content = self.next_response(&request).await;
        Ok(CompletionResponse {
            content,
            model: format!("mock-{}", request.tier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fable_core::ModelTier;

    #[tokio::test]
    async fn queue_then_default() {
        let mock = MockCompletion::with_responses(["first", "second"]);
        assert_eq!(mock.complete_text("a", ModelTier::Fast).await.unwrap(), "first");
        assert_eq!(mock.complete_text("b", ModelTier::Fast).await.unwrap(), "second");
        assert_eq!(
            mock.complete_text("c", ModelTier::Fast).await.unwrap(),
            "mock response"
        );
        assert_eq!(mock.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn rules_take_precedence_over_queue() {
        let mock = MockCompletion::with_responses(["queued"]).when_contains("point of view", "first person");
        assert_eq!(
            mock.complete_text("What point of view is this?", ModelTier::Capable)
                .await
                .unwrap(),
            "first person"
        );
        assert_eq!(
            mock.complete_text("something else", ModelTier::Capable)
                .await
                .unwrap(),
            "queued"
        );
    }

    #[tokio::test]
    async fn failing_mock_returns_error_and_records_request() {
        let mock = MockCompletion::failing("quota exceeded");
        let err = mock.complete_text("hi", ModelTier::Fast).await.unwrap_err();
        assert!(matches!(err, FableError::Completion { .. }));
        assert_eq!(mock.requests().await.len(), 1);
    }
}
