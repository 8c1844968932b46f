use serde::{Deserialize, Serialize};

use super::defaults::*;

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Preferred provider: "openai" or "openrouter".
    #[serde(default = "default_provider")]
    pub default: String,
    /// Model override applied to whichever provider ends up selected.
    #[serde(default)]
    pub model: Option<String>,
    /// Upstream request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            model: None,
            timeout_secs: default_timeout_secs(),
            openai: OpenAiConfig::default(),
            openrouter: OpenRouterConfig::default(),
        }
    }
}

/// OpenAI API provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

/// OpenRouter provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openrouter_model")]
    pub model: String,
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openrouter_model(),
            base_url: default_openrouter_base_url(),
        }
    }
}
