use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Platform;

/// Most reply buttons any transport accepts in one message.
pub const MAX_MENU_BUTTONS: usize = 3;
/// Most rows in a selectable list.
pub const MAX_LIST_ITEMS: usize = 10;
/// Button title limit (WhatsApp reply buttons).
pub const MAX_BUTTON_TITLE: usize = 20;
/// List row title limit.
pub const MAX_LIST_TITLE: usize = 24;
/// List row description limit.
pub const MAX_LIST_DESCRIPTION: usize = 72;

/// What the user sent, after the transport envelope is stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InboundKind {
    /// Free text.
    Text(String),
    /// A reply button was pressed; carries the button id.
    Button(String),
    /// A list row was selected; carries the row id.
    ListSelection(String),
}

/// An inbound message from any transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub platform: Platform,
    /// Platform-specific sender address (phone number, chat id).
    pub sender: String,
    /// Human-readable sender name, when the transport provides one.
    pub sender_name: Option<String>,
    pub kind: InboundKind,
    /// Transport message id (used for read receipts / callback answers).
    #[serde(default)]
    pub message_id: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(platform: Platform, sender: impl Into<String>, kind: InboundKind) -> Self {
        Self {
            platform,
            sender: sender.into(),
            sender_name: None,
            kind,
            message_id: None,
            received_at: Utc::now(),
        }
    }

    /// Shorthand for a plain text event.
    pub fn text(platform: Platform, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(platform, sender, InboundKind::Text(text.into()))
    }
}

/// A reply button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuButton {
    pub id: String,
    pub title: String,
}

impl MenuButton {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A row in a selectable list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Truncate to at most `max` characters (not bytes), marking the cut with `…`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_untouched() {
        assert_eq!(truncate_chars("Auto ride", 24), "Auto ride");
    }

    #[test]
    fn test_truncate_chars_counts_chars() {
        let long = "ಬೆಂಗಳೂರು ಬಸ್ ನಿಲ್ದಾಣದಲ್ಲಿ ಮಾತುಕತೆ";
        let cut = truncate_chars(long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_inbound_kind_serde_shape() {
        let json = serde_json::to_string(&InboundKind::Button("random_chat".into())).unwrap();
        assert_eq!(json, r#"{"kind":"button","value":"random_chat"}"#);
    }
}
