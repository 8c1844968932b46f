//! Twilio SMS adapter.
//!
//! SMS has no interactive widgets: menus are rendered as numbered text, and
//! the adapter remembers the last menu sent to each number so a reply of
//! `2` can be mapped back to the option id.
//! Docs: <https://www.twilio.com/docs/messaging/api/message-resource>

use async_trait::async_trait;
use chatlingo_core::{
    config::SmsConfig,
    error::ChatlingoError,
    identity::normalize_address,
    message::{InboundEvent, InboundKind, MenuButton, MenuItem, MAX_LIST_ITEMS, MAX_MENU_BUTTONS},
    model::Platform,
    traits::PlatformAdapter,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::split_message;

/// Response body that tells Twilio not to send anything itself.
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

const TWILIO_API_URL: &str = "https://api.twilio.com";
/// Concatenated SMS segments get unreliable beyond this.
const MAX_SMS_LEN: usize = 1600;

/// Which widget an outstanding numbered menu stands in for.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuKind {
    Buttons,
    List,
}

/// Twilio adapter.
pub struct SmsAdapter {
    config: SmsConfig,
    client: reqwest::Client,
    messages_url: String,
    /// Last numbered menu per normalized recipient: kind plus option ids.
    last_menus: Mutex<HashMap<String, (MenuKind, Vec<String>)>>,
}

impl SmsAdapter {
    pub fn new(config: SmsConfig) -> Self {
        Self::with_api_url(config, TWILIO_API_URL)
    }

    /// Create an adapter against a different API host.
    pub fn with_api_url(config: SmsConfig, api_url: &str) -> Self {
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            api_url.trim_end_matches('/'),
            config.account_sid
        );
        Self {
            config,
            client: reqwest::Client::new(),
            messages_url,
            last_menus: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SmsConfig {
        &self.config
    }

    /// Parse the webhook form (`From`, `Body`, `MessageSid`) into an event.
    ///
    /// A bare number answering an outstanding menu becomes the matching
    /// button or list selection; everything else is text.
    pub fn parse_form(&self, form: &HashMap<String, String>) -> Option<InboundEvent> {
        let from = form.get("From").map(|s| s.trim()).filter(|s| !s.is_empty())?;
        let body = form.get("Body").map(|s| s.trim().to_string())?;

        let kind = self
            .resolve_menu_reply(from, &body)
            .unwrap_or(InboundKind::Text(body));

        let mut event = InboundEvent::new(Platform::Sms, from, kind);
        event.message_id = form.get("MessageSid").cloned();
        Some(event)
    }

    fn resolve_menu_reply(&self, from: &str, body: &str) -> Option<InboundKind> {
        let choice: usize = body.parse().ok()?;
        let key = normalize_address(Platform::Sms, from);
        let mut menus = self.last_menus.lock().ok()?;
        let (kind, ids) = menus.get(&key)?;
        let id = ids.get(choice.checked_sub(1)?)?.clone();
        let kind = *kind;
        menus.remove(&key);
        debug!("sms: numbered reply {choice} resolved to {id}");
        Some(match kind {
            MenuKind::Buttons => InboundKind::Button(id),
            MenuKind::List => InboundKind::ListSelection(id),
        })
    }

    fn remember_menu(&self, to: &str, kind: MenuKind, ids: Vec<String>) {
        if let Ok(mut menus) = self.last_menus.lock() {
            menus.insert(normalize_address(Platform::Sms, to), (kind, ids));
        }
    }

    fn forget_menu(&self, to: &str) {
        if let Ok(mut menus) = self.last_menus.lock() {
            menus.remove(&normalize_address(Platform::Sms, to));
        }
    }

    async fn post(&self, to: &str, body: &str) -> Result<(), ChatlingoError> {
        let to = if to.starts_with('+') {
            to.to_string()
        } else {
            format!("+{to}")
        };
        let params = [
            ("To", to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];
        let resp = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ChatlingoError::Channel(format!("sms send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(ChatlingoError::Channel(format!(
                "twilio returned {status}: {error_text}"
            )));
        }
        Ok(())
    }
}

/// Render options as a numbered text menu.
pub fn numbered_menu(text: &str, options: &[(String, Option<String>)]) -> String {
    let mut out = text.to_string();
    out.push('\n');
    for (i, (title, desc)) in options.iter().enumerate() {
        out.push_str(&format!("\n{}. {title}", i + 1));
        if let Some(d) = desc.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(" ({d})"));
        }
    }
    out.push_str("\n\nReply with a number.");
    out
}

#[async_trait]
impl PlatformAdapter for SmsAdapter {
    fn platform(&self) -> Platform {
        Platform::Sms
    }

    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), ChatlingoError> {
        self.forget_menu(user_id);
        for chunk in split_message(text, MAX_SMS_LEN) {
            self.post(user_id, &chunk).await?;
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
            warn!("sms: {} buttons requested, sending first {MAX_MENU_BUTTONS}", buttons.len());
        }
        let buttons = &buttons[..buttons.len().min(MAX_MENU_BUTTONS)];
        let options: Vec<(String, Option<String>)> =
            buttons.iter().map(|b| (b.title.clone(), None)).collect();
        self.remember_menu(
            user_id,
            MenuKind::Buttons,
            buttons.iter().map(|b| b.id.clone()).collect(),
        );
        self.post(user_id, &numbered_menu(text, &options)).await
    }

    async fn send_menu_list(
        &self,
        user_id: &str,
        text: &str,
        _button_label: &str,
        items: &[MenuItem],
    ) -> Result<(), ChatlingoError> {
        if items.len() > MAX_LIST_ITEMS {
            warn!("sms: {} list rows requested, sending first {MAX_LIST_ITEMS}", items.len());
        }
        let items = &items[..items.len().min(MAX_LIST_ITEMS)];
        let options: Vec<(String, Option<String>)> = items
            .iter()
            .map(|i| (i.title.clone(), i.description.clone()))
            .collect();
        self.remember_menu(
            user_id,
            MenuKind::List,
            items.iter().map(|i| i.id.clone()).collect(),
        );
        self.post(user_id, &numbered_menu(text, &options)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(from: &str, body: &str) -> HashMap<String, String> {
        HashMap::from([
            ("From".to_string(), from.to_string()),
            ("Body".to_string(), body.to_string()),
            ("MessageSid".to_string(), "SM123".to_string()),
        ])
    }

    fn adapter() -> SmsAdapter {
        SmsAdapter::with_api_url(SmsConfig::default(), "http://127.0.0.1:9")
    }

    #[test]
    fn test_parse_plain_text() {
        let event = adapter().parse_form(&form("+15550001111", " day 3 ")).unwrap();
        assert_eq!(event.platform, Platform::Sms);
        assert_eq!(event.sender, "+15550001111");
        assert_eq!(event.kind, InboundKind::Text("day 3".into()));
        assert_eq!(event.message_id.as_deref(), Some("SM123"));
    }

    #[test]
    fn test_parse_missing_fields() {
        let a = adapter();
        assert!(a.parse_form(&HashMap::new()).is_none());
        let only_from = HashMap::from([("From".to_string(), "+1555".to_string())]);
        assert!(a.parse_form(&only_from).is_none());
    }

    #[test]
    fn test_numbered_reply_maps_to_last_menu() {
        let a = adapter();
        a.remember_menu(
            "+15550001111",
            MenuKind::List,
            vec!["scenario_1".into(), "scenario_2".into()],
        );
        let event = a.parse_form(&form("whatsapp:+1 555 000 1111", "2")).unwrap();
        assert_eq!(event.kind, InboundKind::ListSelection("scenario_2".into()));

        // The menu is consumed; a second "2" is plain text.
        let again = a.parse_form(&form("+15550001111", "2")).unwrap();
        assert_eq!(again.kind, InboundKind::Text("2".into()));
    }

    #[test]
    fn test_out_of_range_number_is_text() {
        let a = adapter();
        a.remember_menu("+15550001111", MenuKind::Buttons, vec!["random_chat".into()]);
        let event = a.parse_form(&form("+15550001111", "0")).unwrap();
        assert_eq!(event.kind, InboundKind::Text("0".into()));
        let event = a.parse_form(&form("+15550001111", "1")).unwrap();
        assert_eq!(event.kind, InboundKind::Button("random_chat".into()));
    }

    #[test]
    fn test_numbered_menu_rendering() {
        let out = numbered_menu(
            "Pick one",
            &[
                ("Auto ride".into(), Some("Haggle".into())),
                ("Darshini".into(), None),
            ],
        );
        assert!(out.starts_with("Pick one\n"));
        assert!(out.contains("\n1. Auto ride (Haggle)"));
        assert!(out.contains("\n2. Darshini"));
        assert!(out.ends_with("Reply with a number."));
    }

    #[tokio::test]
    async fn test_menu_is_remembered_even_if_delivery_fails() {
        let a = adapter();
        let buttons = vec![MenuButton::new("random_chat", "Chat")];
        assert!(a.send_menu_buttons("15550001111", "Menu", &buttons).await.is_err());
        let event = a.parse_form(&form("+15550001111", "1")).unwrap();
        assert_eq!(event.kind, InboundKind::Button("random_chat".into()));
    }
}
