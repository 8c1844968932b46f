//! Inbound webhook: subscription handshake and message parsing.

use chatlingo_core::{
    message::{InboundEvent, InboundKind},
    model::Platform,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct WaWebhook {
    #[serde(default)]
    entry: Vec<WaEntry>,
}

#[derive(Debug, Deserialize)]
struct WaEntry {
    #[serde(default)]
    changes: Vec<WaChange>,
}

#[derive(Debug, Deserialize)]
struct WaChange {
    value: WaValue,
}

#[derive(Debug, Deserialize)]
struct WaValue {
    #[serde(default)]
    contacts: Vec<WaContact>,
    #[serde(default)]
    messages: Vec<WaMessage>,
}

#[derive(Debug, Deserialize)]
struct WaContact {
    profile: Option<WaProfile>,
}

#[derive(Debug, Deserialize)]
struct WaProfile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    from: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    text: Option<WaText>,
    interactive: Option<WaInteractive>,
    button: Option<WaButton>,
}

#[derive(Debug, Deserialize)]
struct WaText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct WaInteractive {
    button_reply: Option<WaReply>,
    list_reply: Option<WaReply>,
}

#[derive(Debug, Deserialize)]
struct WaReply {
    id: String,
}

/// Template quick-reply button.
#[derive(Debug, Deserialize)]
struct WaButton {
    payload: Option<String>,
    text: Option<String>,
}

/// Parse a webhook body into an inbound event.
///
/// Returns `None` for anything that is not a user message we handle (status
/// callbacks, media, malformed JSON).
pub fn parse_webhook(body: &[u8]) -> Option<InboundEvent> {
    let payload: WaWebhook = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            debug!("whatsapp: unparseable webhook body: {e}");
            return None;
        }
    };

    let value = &payload.entry.first()?.changes.first()?.value;
    let message = value.messages.first()?;

    let kind = match message.kind.as_str() {
        "text" => InboundKind::Text(message.text.as_ref()?.body.clone()),
        "interactive" => {
            let interactive = message.interactive.as_ref()?;
            if let Some(reply) = &interactive.button_reply {
                InboundKind::Button(reply.id.clone())
            } else if let Some(reply) = &interactive.list_reply {
                InboundKind::ListSelection(reply.id.clone())
            } else {
                return None;
            }
        }
        "button" => {
            let button = message.button.as_ref()?;
            InboundKind::Button(button.payload.clone().or_else(|| button.text.clone())?)
        }
        other => {
            debug!("whatsapp: ignoring message type {other}");
            return None;
        }
    };

    let mut event = InboundEvent::new(Platform::WhatsApp, message.from.clone(), kind);
    event.message_id = Some(message.id.clone());
    event.sender_name = value
        .contacts
        .first()
        .and_then(|c| c.profile.as_ref())
        .and_then(|p| p.name.clone());
    Some(event)
}

/// Answer the `GET` subscription handshake.
///
/// Returns the challenge to echo when `mode` is `subscribe` and the token
/// matches, `None` otherwise. An empty configured token never matches.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    if expected_token.is_empty() {
        return None;
    }
    match (mode, token, challenge) {
        (Some("subscribe"), Some(t), Some(c)) if t == expected_token => Some(c.to_string()),
        _ => None,
    }
}
