// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion adapter trait for text-to-text language model services.

use async_trait::async_trait;

use crate::error::FableError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse, ModelTier};

/// Adapter for a text completion service.
///
/// Failures surface as [`FableError::Completion`]; an adapter never returns
/// empty text in place of an error, and never retries on its own.
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, FableError>;

    /// Convenience wrapper returning only the generated text.
    async fn complete_text(&self, prompt: &str, tier: ModelTier) -> Result<String, FableError> {
        let response = self.complete(CompletionRequest::new(prompt, tier)).await?;
        Ok(response.content)
    }
}
