//! Outbound sends and callback acknowledgements.

use async_trait::async_trait;
use chatlingo_core::{
    error::ChatlingoError,
    message::{truncate_chars, MenuButton, MenuItem, MAX_LIST_ITEMS, MAX_MENU_BUTTONS},
    model::Platform,
    traits::PlatformAdapter,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{types::TgResponse, TelegramAdapter};
use crate::split_message;

const MAX_MESSAGE_LEN: usize = 4096;
/// Inline keyboard button text limit we apply (the API allows more, phones don't).
const MAX_KEYBOARD_TEXT: usize = 40;

/// `sendMessage` body with one inline-keyboard row per option.
pub fn keyboard_payload(chat_id: &str, text: &str, options: &[(String, String)]) -> Value {
    let rows: Vec<Value> = options
        .iter()
        .map(|(id, title)| {
            json!([{ "text": truncate_chars(title, MAX_KEYBOARD_TEXT), "callback_data": id }])
        })
        .collect();
    json!({
        "chat_id": chat_id,
        "text": text,
        "reply_markup": { "inline_keyboard": rows },
    })
}

impl TelegramAdapter {
    async fn call(&self, method: &str, body: &Value) -> Result<(), ChatlingoError> {
        let url = format!("{}/{method}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatlingoError::Channel(format!("telegram {method} failed: {e}")))?;

        let status = resp.status();
        let parsed: Option<TgResponse> = resp.json().await.ok();
        match parsed {
            Some(r) if r.ok => Ok(()),
            Some(r) => Err(ChatlingoError::Channel(format!(
                "telegram {method} returned {status}: {}",
                r.description.unwrap_or_default()
            ))),
            None => Err(ChatlingoError::Channel(format!(
                "telegram {method} returned {status} with unreadable body"
            ))),
        }
    }

    /// Stop the client's loading spinner after a keyboard press.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<(), ChatlingoError> {
        debug!("telegram: answering callback {callback_id}");
        self.call(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id }),
        )
        .await
    }
}

#[async_trait]
impl PlatformAdapter for TelegramAdapter {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), ChatlingoError> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.call("sendMessage", &json!({ "chat_id": user_id, "text": chunk }))
                .await?;
        }
        Ok(())
    }

    async fn send_menu_buttons(
        &self,
        user_id: &str,
        text: &str,
        buttons: &[MenuButton],
    ) -> Result<(), ChatlingoError> {
        if buttons.len() > MAX_MENU_BUTTONS {
            warn!("telegram: {} buttons requested, sending first {MAX_MENU_BUTTONS}", buttons.len());
        }
        let options: Vec<(String, String)> = buttons
            .iter()
            .take(MAX_MENU_BUTTONS)
            .map(|b| (b.id.clone(), b.title.clone()))
            .collect();
        self.call("sendMessage", &keyboard_payload(user_id, text, &options))
            .await
    }

    async fn send_menu_list(
        &self,
        user_id: &str,
        text: &str,
        _button_label: &str,
        items: &[MenuItem],
    ) -> Result<(), ChatlingoError> {
        if items.len() > MAX_LIST_ITEMS {
            warn!("telegram: {} list rows requested, sending first {MAX_LIST_ITEMS}", items.len());
        }
        let items = &items[..items.len().min(MAX_LIST_ITEMS)];

        // Keyboards have no row descriptions; fold them into the message body.
        let mut body = text.to_string();
        for item in items {
            if let Some(desc) = item.description.as_deref().filter(|d| !d.is_empty()) {
                body.push_str(&format!("\n• {}: {desc}", item.title));
            }
        }
        let options: Vec<(String, String)> = items
            .iter()
            .map(|i| (i.id.clone(), i.title.clone()))
            .collect();
        self.call("sendMessage", &keyboard_payload(user_id, &body, &options))
            .await
    }
}
