use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub whatsapp: Option<WhatsAppConfig>,
    pub telegram: Option<TelegramConfig>,
    pub sms: Option<SmsConfig>,
}

/// WhatsApp Cloud API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub phone_number_id: String,
    /// Token echoed back during the webhook verification handshake.
    #[serde(default)]
    pub verify_token: String,
    #[serde(default = "default_whatsapp_api_version")]
    pub api_version: String,
    /// Allowed phone numbers (e.g. `["919845012345"]`). Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_token: String::new(),
            phone_number_id: String::new(),
            verify_token: String::new(),
            api_version: default_whatsapp_api_version(),
            allowed_users: Vec::new(),
        }
    }
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header. Empty = not checked.
    #[serde(default)]
    pub webhook_secret: String,
    /// Allowed Telegram user ids. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

/// Twilio SMS config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SmsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Sender number in E.164 form.
    #[serde(default)]
    pub from_number: String,
    /// Allowed phone numbers. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}
