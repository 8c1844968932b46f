//! Outbound payloads and the `PlatformAdapter` implementation.

use async_trait::async_trait;
use chatlingo_core::{
    error::ChatlingoError,
    message::{
        truncate_chars, MenuButton, MenuItem, MAX_BUTTON_TITLE, MAX_LIST_DESCRIPTION,
        MAX_LIST_ITEMS, MAX_LIST_TITLE, MAX_MENU_BUTTONS,
    },
    model::Platform,
    traits::PlatformAdapter,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::WhatsAppAdapter;
use crate::split_message;

/// Cloud API body text limit.
const MAX_BODY_LEN: usize = 4096;
/// Interactive message body limit.
const MAX_INTERACTIVE_BODY: usize = 1024;

/// Plain text message body.
pub fn text_payload(to: &str, text: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": { "preview_url": false, "body": text },
    })
}

/// Reply-button message body. Extra buttons beyond three are dropped.
pub fn buttons_payload(to: &str, text: &str, buttons: &[MenuButton]) -> Value {
    let buttons: Vec<Value> = buttons
        .iter()
        .take(MAX_MENU_BUTTONS)
        .map(|b| {
            json!({
                "type": "reply",
                "reply": { "id": b.id, "title": truncate_chars(&b.title, MAX_BUTTON_TITLE) },
            })
        })
        .collect();
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": truncate_chars(text, MAX_INTERACTIVE_BODY) },
            "action": { "buttons": buttons },
        },
    })
}

/// List message body. Extra rows beyond ten are dropped.
pub fn list_payload(to: &str, text: &str, button_label: &str, items: &[MenuItem]) -> Value {
    let rows: Vec<Value> = items
        .iter()
        .take(MAX_LIST_ITEMS)
        .map(|item| {
            let mut row = json!({
                "id": item.id,
                "title": truncate_chars(&item.title, MAX_LIST_TITLE),
            });
            if let Some(desc) = item.description.as_deref().filter(|d| !d.is_empty()) {
                row["description"] = json!(truncate_chars(desc, MAX_LIST_DESCRIPTION));
            }
            row
        })
        .collect();
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "list",
            "body": { "text": truncate_chars(text, MAX_INTERACTIVE_BODY) },
            "action": {
                "button": truncate_chars(button_label, MAX_BUTTON_TITLE),
                "sections": [{ "title": "Options", "rows": rows }],
            },
        },
    })
}

impl WhatsAppAdapter {
    async fn post(&self, body: &Value) -> Result<(), ChatlingoError> {
        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatlingoError::Channel(format!("whatsapp send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(ChatlingoError::Channel(format!(
                "whatsapp returned {status}: {error_text}"
            )));
        }
        Ok(())
    }

    /// Send a read receipt for an inbound message.
    pub async fn mark_read(&self, message_id: &str) -> Result<(), ChatlingoError> {
        debug!("whatsapp: marking {message_id} read");
        self.post(&json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        }))
        .await
    }
}

#[async_trait]
impl PlatformAdapter for WhatsAppAdapter {
    fn platform(&self) -> Platform {
        Platform::WhatsApp
    }

    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), ChatlingoError> {
        for chunk in split_message(text, MAX_BODY_LEN) {
            self.post(&text_payload(user_id, &chunk)).await?;
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
            warn!(
                "whatsapp: {} buttons requested, sending first {MAX_MENU_BUTTONS}",
                buttons.len()
            );
        }
        self.post(&buttons_payload(user_id, text, buttons)).await
    }

    async fn send_menu_list(
        &self,
        user_id: &str,
        text: &str,
        button_label: &str,
        items: &[MenuItem],
    ) -> Result<(), ChatlingoError> {
        if items.len() > MAX_LIST_ITEMS {
            warn!(
                "whatsapp: {} list rows requested, sending first {MAX_LIST_ITEMS}",
                items.len()
            );
        }
        self.post(&list_payload(user_id, text, button_label, items))
            .await
    }
}
