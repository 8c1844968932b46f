//! In-memory adapter for the synchronous web chat surface.
//!
//! The engine sends into a per-recipient outbox; the HTTP handler drains it
//! after the turn completes and returns the replies in the response body.

use async_trait::async_trait;
use chatlingo_core::{
    error::ChatlingoError,
    message::{MenuButton, MenuItem},
    model::Platform,
    traits::PlatformAdapter,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// A selectable option attached to a web reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebOption {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One outbound message for the web client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebReply {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<WebOption>,
}

/// Buffers outbound messages per recipient.
#[derive(Default)]
pub struct WebAdapter {
    outbox: Mutex<HashMap<String, Vec<WebReply>>>,
}

impl WebAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything queued for `user_id`, oldest first.
    pub fn drain(&self, user_id: &str) -> Vec<WebReply> {
        self.outbox
            .lock()
            .map(|mut o| o.remove(user_id).unwrap_or_default())
            .unwrap_or_default()
    }

    fn push(&self, user_id: &str, reply: WebReply) -> Result<(), ChatlingoError> {
        let mut outbox = self
            .outbox
            .lock()
            .map_err(|_| ChatlingoError::Channel("web outbox poisoned".into()))?;
        outbox.entry(user_id.to_string()).or_default().push(reply);
        Ok(())
    }
}

#[async_trait]
impl PlatformAdapter for WebAdapter {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), ChatlingoError> {
        self.push(
            user_id,
            WebReply {
                text: text.to_string(),
                options: Vec::new(),
            },
        )
    }

    async fn send_menu_buttons(
        &self,
        user_id: &str,
        text: &str,
        buttons: &[MenuButton],
    ) -> Result<(), ChatlingoError> {
        self.push(
            user_id,
            WebReply {
                text: text.to_string(),
                options: buttons
                    .iter()
                    .map(|b| WebOption {
                        id: b.id.clone(),
                        title: b.title.clone(),
                        description: None,
                    })
                    .collect(),
            },
        )
    }

    async fn send_menu_list(
        &self,
        user_id: &str,
        text: &str,
        _button_label: &str,
        items: &[MenuItem],
    ) -> Result<(), ChatlingoError> {
        self.push(
            user_id,
            WebReply {
                text: text.to_string(),
                options: items
                    .iter()
                    .map(|i| WebOption {
                        id: i.id.clone(),
                        title: i.title.clone(),
                        description: i.description.clone(),
                    })
                    .collect(),
            },
        )
    }
}
