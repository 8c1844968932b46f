//! Telegram Bot API adapter.
//!
//! Updates arrive on the webhook and are parsed by [`parse_update`]; replies go
//! out through `sendMessage` with inline keyboards for menus.
//! Docs: <https://core.telegram.org/bots/api>

mod send;
pub mod types;

#[cfg(test)]
mod tests;

pub use send::keyboard_payload;
pub use types::TgUpdate;

use chatlingo_core::{
    config::TelegramConfig,
    message::{InboundEvent, InboundKind},
    model::Platform,
};

/// Header Telegram sets when the webhook was registered with a secret token.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram adapter using the Bot API.
pub struct TelegramAdapter {
    config: TelegramConfig,
    client: reqwest::Client,
    base_url: String,
}

impl TelegramAdapter {
    /// Create a new Telegram adapter from config.
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_api_url(config, TELEGRAM_API_URL)
    }

    /// Create an adapter against a different Bot API host.
    pub fn with_api_url(config: TelegramConfig, api_url: &str) -> Self {
        let base_url = format!("{}/bot{}", api_url.trim_end_matches('/'), config.bot_token);
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Whether a webhook request carries the configured secret.
    ///
    /// No secret configured means every request is accepted.
    pub fn secret_matches(&self, header: Option<&str>) -> bool {
        self.config.webhook_secret.is_empty() || header == Some(self.config.webhook_secret.as_str())
    }
}

/// Turn an update into an inbound event.
///
/// Text messages become `Text` (including commands such as `/start`); inline
/// keyboard presses become `Button` with the callback data, and carry the
/// callback query id in `message_id` so it can be answered. Anything else
/// yields `None`.
pub fn parse_update(update: &TgUpdate) -> Option<InboundEvent> {
    if let Some(cb) = &update.callback_query {
        let data = cb.data.clone()?;
        let chat_id = cb
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .unwrap_or(cb.from.id);
        let mut event = InboundEvent::new(Platform::Telegram, chat_id.to_string(), InboundKind::Button(data));
        event.message_id = Some(cb.id.clone());
        event.sender_name = Some(cb.from.first_name.clone());
        return Some(event);
    }

    let message = update.message.as_ref()?;
    let text = message.text.clone()?;
    let mut event = InboundEvent::text(Platform::Telegram, message.chat.id.to_string(), text);
    event.message_id = Some(message.message_id.to_string());
    event.sender_name = message.from.as_ref().map(|u| u.first_name.clone());
    Some(event)
}
