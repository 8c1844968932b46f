//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Chatlingo".to_string()
}

pub fn default_data_dir() -> String {
    "~/.chatlingo".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_environment() -> String {
    "development".to_string()
}

pub fn default_provider() -> String {
    "openrouter".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_deny_message() -> String {
    "Sorry, this number is not on the Chatlingo guest list yet. Ask the admin to add you!"
        .to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_openrouter_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

pub fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

pub fn default_timeout_secs() -> u64 {
    30
}

pub fn default_whatsapp_api_version() -> String {
    "v22.0".to_string()
}

pub fn default_db_path() -> String {
    "~/.chatlingo/data/chatlingo.db".to_string()
}

pub fn default_chat_history_limit() -> u32 {
    10
}

pub fn default_scenario_history_limit() -> u32 {
    50
}

pub fn default_nudge_time() -> String {
    // 09:00 IST.
    "03:30".to_string()
}

pub fn default_nudge_concurrency() -> usize {
    4
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    8000
}
