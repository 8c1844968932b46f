//! OpenRouter proxy provider.
//!
//! Reuses OpenAI's request/response types. Only the base URL and provider
//! name differ.

use async_trait::async_trait;
use chatlingo_core::{context::CompletionRequest, error::ChatlingoError, traits::Provider};

use crate::openai::{http_client, post_chat_completion, ChatCompletionRequest};

/// OpenRouter provider: routes requests to many models via the OpenAI-compatible API.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            base_url,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatlingoError> {
        let effective_model = request.model.as_deref().unwrap_or(&self.model);
        let body = ChatCompletionRequest::from_request(effective_model, request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        post_chat_completion(&self.client, &url, &self.api_key, &body, "openrouter").await
    }
}
