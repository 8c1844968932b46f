//! OpenAI-compatible API provider.
//!
//! Works with OpenAI's API and any compatible endpoint.
//! Exports `pub(crate)` types reused by the OpenRouter provider.

use async_trait::async_trait;
use chatlingo_core::{context::CompletionRequest, error::ChatlingoError, traits::Provider};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
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

/// Build a client with a fixed per-request timeout.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!("http client builder failed ({e}), using defaults");
            reqwest::Client::new()
        })
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub(crate) fn from_request(model: &str, request: &CompletionRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: request
                .to_api_messages()
                .into_iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
            temperature: request.profile.temperature(),
            max_tokens: request.profile.max_tokens(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

impl ChatCompletionResponse {
    /// First choice's text, if the provider returned a non-empty one.
    pub(crate) fn first_text(&self) -> Option<String> {
        self.choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// POST a chat completion and return the reply text.
///
/// Shared by every OpenAI-compatible provider; `provider` is only used in
/// log lines and error messages.
pub(crate) async fn post_chat_completion(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &ChatCompletionRequest,
    provider: &str,
) -> Result<String, ChatlingoError> {
    let start = Instant::now();
    debug!(
        "{provider}: POST {url} model={} messages={} temperature={} max_tokens={}",
        body.model,
        body.messages.len(),
        body.temperature,
        body.max_tokens
    );

    let resp = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(body)
        .send()
        .await
        .map_err(|e| ChatlingoError::Provider(format!("{provider} request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(ChatlingoError::Provider(format!(
            "{provider} returned {status}: {text}"
        )));
    }

    let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
        ChatlingoError::Provider(format!("{provider}: failed to parse response: {e}"))
    })?;

    let text = parsed
        .first_text()
        .ok_or_else(|| ChatlingoError::Provider(format!("{provider}: empty completion")))?;

    debug!(
        "{provider}: {} chars, {} tokens in {}ms",
        text.len(),
        parsed.usage.as_ref().and_then(|u| u.total_tokens).unwrap_or(0),
        start.elapsed().as_millis()
    );
    Ok(text)
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        post_chat_completion(&self.client, &url, &self.api_key, &body, "openai").await
    }
}
