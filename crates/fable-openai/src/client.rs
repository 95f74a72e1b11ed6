// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible APIs.
//!
//! Provides [`OpenAiClient`] which handles authentication, request
//! construction, and error decoding. Requests are sent exactly once.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
};

/// A failed API call, before it is attributed to a service.
#[derive(Debug)]
pub struct ApiFailure {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ApiFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    fn with_source(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// HTTP client for chat completions and embeddings.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    /// Creates a client sending `Authorization: Bearer <api_key>` to `base_url`.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, String> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| format!("invalid API key header value: {e}"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiFailure> {
        self.post("chat/completions", request).await
    }

    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ApiFailure> {
        self.post("embeddings", request).await
    }

    async fn post<Req, Resp>(&self, endpoint: &str, body: &Req) -> Result<Resp, ApiFailure>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiFailure::with_source(format!("HTTP request failed: {e}"), e))?;

        let status = response.status();
        debug!(status = %status, endpoint, "response received");

        if status.is_success() {
            let text = response.text().await.map_err(|e| {
                ApiFailure::with_source(format!("failed to read response body: {e}"), e)
            })?;
            return serde_json::from_str(&text).map_err(|e| ApiFailure {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiFailure::new(describe_error(status, &body)))
    }
}

/// A one-line description of an error response. Only the API's own error
/// type and message are surfaced; unrecognised bodies are reduced to the
/// status line.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "API error {} ({}): {}",
            status.as_u16(),
            api_err.error.type_.as_deref().unwrap_or("unknown"),
            api_err.error.message
        ),
        Err(_) => format!("API returned {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("test-api-key", base_url, Duration::from_secs(5)).unwrap()
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            max_tokens: Some(64),
        }
    }

    #[tokio::test]
    async fn chat_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-3.5-turbo", "max_tokens": 64})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-3.5-turbo-0613",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = test_client(&server.uri()).chat(&chat_request()).await.unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("Hi!"));
        assert_eq!(resp.model, "gpt-3.5-turbo-0613");
    }

    #[tokio::test]
    async fn trailing_slash_is_normalized() {
        let client = test_client("http://localhost:1234/v1/");
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
    }

    #[tokio::test]
    async fn api_error_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "Bad model"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).chat(&chat_request()).await.unwrap_err();
        assert!(err.message.contains("invalid_request_error"), "got: {}", err.message);
        assert!(err.message.contains("Bad model"));
    }

    #[tokio::test]
    async fn transient_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>upstream exploded</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).chat(&chat_request()).await.unwrap_err();
        assert!(err.message.contains("503"));
        assert!(!err.message.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .embeddings(&EmbeddingRequest {
                model: "text-embedding-ada-002".into(),
                input: vec!["a".into()],
            })
            .await
            .unwrap_err();
        assert!(err.message.starts_with("failed to parse API response"));
        assert!(err.source.is_some());
    }
}
