//! LLM gateway: one provider chosen at startup, never-failing completions.

use std::sync::Arc;

use chatlingo_core::{
    config::{Prompts, ProviderConfig},
    context::{ChatTurn, CompletionProfile, CompletionRequest},
    error::ChatlingoError,
    traits::Provider,
};
use tracing::{error, info, warn};

use crate::{openai::OpenAiProvider, openrouter::OpenRouterProvider};

/// Wraps the selected provider and turns every upstream failure into a
/// fixed, in-character reply.
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn Provider>,
    fallback_chat: String,
    fallback_roleplay: String,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn Provider>, prompts: &Prompts) -> Self {
        Self {
            provider,
            fallback_chat: prompts.fallback_chat.clone(),
            fallback_roleplay: prompts.fallback_roleplay.clone(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The text returned when a completion with `profile` fails.
    pub fn fallback_text(&self, profile: CompletionProfile) -> &str {
        match profile {
            CompletionProfile::Chat => &self.fallback_chat,
            CompletionProfile::Roleplay => &self.fallback_roleplay,
        }
    }

    /// Complete `system_prompt` + `history`. Never returns an error.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: Vec<ChatTurn>,
        profile: CompletionProfile,
    ) -> String {
        let request = CompletionRequest::new(system_prompt, history).with_profile(profile);
        self.complete_request(&request).await
    }

    /// Same as [`complete`](Self::complete) for a prebuilt request.
    pub async fn complete_request(&self, request: &CompletionRequest) -> String {
        match self.try_complete_request(request).await {
            Ok(text) => text,
            Err(_) => self.fallback_text(request.profile).to_string(),
        }
    }

    /// Complete without substituting fallback text. Failures are logged and
    /// returned so the caller can choose its own replacement.
    pub async fn try_complete(
        &self,
        system_prompt: &str,
        history: Vec<ChatTurn>,
        profile: CompletionProfile,
    ) -> Result<String, ChatlingoError> {
        let request = CompletionRequest::new(system_prompt, history).with_profile(profile);
        self.try_complete_request(&request).await
    }

    async fn try_complete_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ChatlingoError> {
        self.provider.complete(request).await.inspect_err(|e| {
            error!(
                "llm: {} failed ({:?}, {} turns): {e}",
                self.provider.name(),
                request.profile,
                request.history.len()
            );
        })
    }
}

/// Build the configured provider, substituting the other one when the
/// preferred provider has no credentials.
pub fn build_provider(cfg: &ProviderConfig) -> Result<Arc<dyn Provider>, ChatlingoError> {
    let openai_model = cfg.model.clone().unwrap_or_else(|| cfg.openai.model.clone());
    let openrouter_model = cfg
        .model
        .clone()
        .unwrap_or_else(|| cfg.openrouter.model.clone());

    let openai: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(
        cfg.openai.base_url.clone(),
        cfg.openai.api_key.clone(),
        openai_model,
        cfg.timeout_secs,
    ));
    let openrouter: Arc<dyn Provider> = Arc::new(OpenRouterProvider::from_config(
        cfg.openrouter.base_url.clone(),
        cfg.openrouter.api_key.clone(),
        openrouter_model,
        cfg.timeout_secs,
    ));

    let (preferred, alternate) = match cfg.default.as_str() {
        "openai" => (openai, openrouter),
        "openrouter" => (openrouter, openai),
        other => {
            return Err(ChatlingoError::Config(format!(
                "unsupported provider: {other}"
            )))
        }
    };

    let selected = select(preferred, alternate);
    info!("llm: using provider {}", selected.name());
    Ok(selected)
}

fn select(preferred: Arc<dyn Provider>, alternate: Arc<dyn Provider>) -> Arc<dyn Provider> {
    if preferred.has_credentials() || !preferred.requires_api_key() {
        return preferred;
    }
    if alternate.has_credentials() {
        warn!(
            "llm: {} has no credentials, falling back to {}",
            preferred.name(),
            alternate.name()
        );
        return alternate;
    }
    warn!(
        "llm: no provider has credentials; every reply will be the fallback text"
    );
    preferred
}
