mod channels;
mod defaults;
mod prompts;
mod providers;


pub use channels::*;
pub use prompts::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ChatlingoError;
use defaults::*;

/// Top-level Chatlingo configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chatlingo: ChatlingoConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub curriculum: CurriculumConfig,
    #[serde(default)]
    pub scenarios: ScenariosConfig,
    #[serde(default)]
    pub nudge: NudgeConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatlingoConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Reported by `/health` (e.g. "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
}

impl Default for ChatlingoConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            environment: default_environment(),
            debug: false,
        }
    }
}

/// Allow-list enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false, every transport accepts every sender.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Message sent to senders outside the allow-list.
    #[serde(default = "default_deny_message")]
    pub deny_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            deny_message: default_deny_message(),
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// History window for random chat and lessons.
    #[serde(default = "default_chat_history_limit")]
    pub chat_history_limit: u32,
    /// History window for a scenario session.
    #[serde(default = "default_scenario_history_limit")]
    pub scenario_history_limit: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            chat_history_limit: default_chat_history_limit(),
            scenario_history_limit: default_scenario_history_limit(),
        }
    }
}

/// What the `start` keyword does.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartBehavior {
    /// `start` is a global reset to the menu.
    #[default]
    Menu,
    /// `start` begins day 1 of the curriculum.
    DayOne,
}

/// How a greeting from a returning user in `day_curriculum` moves the cursor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturningGreeting {
    /// Move to the next day, clamped at the last one.
    #[default]
    Advance,
    /// Re-send the current day.
    Remind,
}

/// Curriculum config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// Path to a curriculum TOML. Unset or missing = bundled 30-day plan.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub start_behavior: StartBehavior,
    #[serde(default)]
    pub returning_greeting: ReturningGreeting,
}

/// Scenario seed config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenariosConfig {
    /// Path to a scenario seed TOML. Unset = bundled scenarios.
    #[serde(default)]
    pub path: Option<String>,
}

/// Daily re-engagement sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Time of day in UTC, "HH:MM".
    #[serde(default = "default_nudge_time")]
    pub time: String,
    /// Users nudged in parallel.
    #[serde(default = "default_nudge_concurrency")]
    pub max_concurrency: usize,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time: default_nudge_time(),
            max_concurrency: default_nudge_concurrency(),
        }
    }
}

/// HTTP server configuration: webhooks, web chat and admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for admin endpoints. Empty = no auth (for local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ChatlingoError> {
    let mut config = load_file(path)?;
    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn load_file(path: &str) -> Result<Config, ChatlingoError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ChatlingoError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| ChatlingoError::Config(format!("failed to parse config: {}", e)))
}

impl Config {
    /// Overlay credentials and provider choice from the environment.
    ///
    /// `lookup` is injected so tests do not touch the process environment.
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.provider.openai.api_key = v;
        }
        if let Some(v) = get("OPENROUTER_API_KEY") {
            self.provider.openrouter.api_key = v;
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.provider.default = v.to_lowercase();
        }
        if let Some(v) = get("LLM_MODEL") {
            self.provider.model = Some(v);
        }

        if let Some(v) = get("WHATSAPP_ACCESS_TOKEN") {
            self.channel
                .whatsapp
                .get_or_insert_with(WhatsAppConfig::default)
                .access_token = v;
        }
        if let Some(v) = get("WHATSAPP_PHONE_ID") {
            self.channel
                .whatsapp
                .get_or_insert_with(WhatsAppConfig::default)
                .phone_number_id = v;
        }
        if let Some(v) = get("WHATSAPP_VERIFY_TOKEN") {
            self.channel
                .whatsapp
                .get_or_insert_with(WhatsAppConfig::default)
                .verify_token = v;
        }

        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.channel
                .telegram
                .get_or_insert_with(TelegramConfig::default)
                .bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_WEBHOOK_SECRET") {
            self.channel
                .telegram
                .get_or_insert_with(TelegramConfig::default)
                .webhook_secret = v;
        }

        if let Some(v) = get("TWILIO_ACCOUNT_SID") {
            self.channel.sms.get_or_insert_with(SmsConfig::default).account_sid = v;
        }
        if let Some(v) = get("TWILIO_AUTH_TOKEN") {
            self.channel.sms.get_or_insert_with(SmsConfig::default).auth_token = v;
        }
        if let Some(v) = get("TWILIO_FROM_NUMBER") {
            self.channel.sms.get_or_insert_with(SmsConfig::default).from_number = v;
        }

        if let Some(v) = get("CHATLINGO_API_KEY") {
            self.api.api_key = v;
        }
    }

    /// Reject values that would make the engine misbehave at runtime.
    pub fn validate(&self) -> Result<(), ChatlingoError> {
        if self.memory.chat_history_limit == 0 {
            return Err(ChatlingoError::Config(
                "memory.chat_history_limit must be at least 1".into(),
            ));
        }
        if self.memory.scenario_history_limit == 0 {
            return Err(ChatlingoError::Config(
                "memory.scenario_history_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> String {
        format!("{}/logs", shellexpand(&self.chatlingo.data_dir))
    }
}
