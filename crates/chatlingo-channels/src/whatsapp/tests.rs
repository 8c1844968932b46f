use super::*;
use chatlingo_core::{
    config::WhatsAppConfig,
    message::{InboundKind, MenuButton, MenuItem},
    model::Platform,
    traits::PlatformAdapter,
};

fn envelope(message: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "contacts": [{ "profile": { "name": "Asha" }, "wa_id": "919845012345" }],
                    "messages": [message],
                }
            }]
        }]
    }))
    .unwrap()
}

#[test]
fn test_parse_text_message() {
    let body = envelope(serde_json::json!({
        "from": "919845012345",
        "id": "wamid.1",
        "timestamp": "1700000000",
        "type": "text",
        "text": { "body": "day 5" }
    }));
    let event = parse_webhook(&body).unwrap();
    assert_eq!(event.platform, Platform::WhatsApp);
    assert_eq!(event.sender, "919845012345");
    assert_eq!(event.kind, InboundKind::Text("day 5".into()));
    assert_eq!(event.message_id.as_deref(), Some("wamid.1"));
    assert_eq!(event.sender_name.as_deref(), Some("Asha"));
}

#[test]
fn test_parse_button_reply() {
    let body = envelope(serde_json::json!({
        "from": "919845012345",
        "id": "wamid.2",
        "type": "interactive",
        "interactive": { "type": "button_reply", "button_reply": { "id": "random_chat", "title": "Random Chat" } }
    }));
    let event = parse_webhook(&body).unwrap();
    assert_eq!(event.kind, InboundKind::Button("random_chat".into()));
}

#[test]
fn test_parse_list_reply() {
    let body = envelope(serde_json::json!({
        "from": "919845012345",
        "id": "wamid.3",
        "type": "interactive",
        "interactive": { "type": "list_reply", "list_reply": { "id": "scenario_2", "title": "Darshini" } }
    }));
    let event = parse_webhook(&body).unwrap();
    assert_eq!(event.kind, InboundKind::ListSelection("scenario_2".into()));
}

#[test]
fn test_status_callback_is_dropped() {
    let body = serde_json::to_vec(&serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{ "changes": [{ "value": { "statuses": [{ "id": "wamid.1", "status": "read" }] } }] }]
    }))
    .unwrap();
    assert!(parse_webhook(&body).is_none());
}

#[test]
fn test_garbage_and_media_are_dropped() {
    assert!(parse_webhook(b"not json").is_none());
    assert!(parse_webhook(b"{}").is_none());
    let body = envelope(serde_json::json!({
        "from": "919845012345",
        "id": "wamid.4",
        "type": "image",
        "image": { "id": "media" }
    }));
    assert!(parse_webhook(&body).is_none());
}

#[test]
fn test_verify_subscription() {
    assert_eq!(
        verify_subscription(Some("subscribe"), Some("tok"), Some("12345"), "tok"),
        Some("12345".into())
    );
    assert_eq!(
        verify_subscription(Some("subscribe"), Some("wrong"), Some("12345"), "tok"),
        None
    );
    assert_eq!(
        verify_subscription(Some("unsubscribe"), Some("tok"), Some("1"), "tok"),
        None
    );
    assert_eq!(verify_subscription(Some("subscribe"), Some(""), Some("1"), ""), None);
}

#[test]
fn test_buttons_payload_caps_and_truncates() {
    let buttons = vec![
        MenuButton::new("a", "🎭 Practice a scenario today"),
        MenuButton::new("b", "B"),
        MenuButton::new("c", "C"),
        MenuButton::new("d", "D"),
    ];
    let p = buttons_payload("919845012345", "Pick one", &buttons);
    let sent = p["interactive"]["action"]["buttons"].as_array().unwrap();
    assert_eq!(sent.len(), 3);
    let title = sent[0]["reply"]["title"].as_str().unwrap();
    assert!(title.chars().count() <= 20);
    assert_eq!(sent[0]["reply"]["id"], "a");
    assert_eq!(p["interactive"]["type"], "button");
}

#[test]
fn test_list_payload_shape() {
    let items: Vec<MenuItem> = (1..=12)
        .map(|i| MenuItem {
            id: format!("scenario_{i}"),
            title: format!("Scenario number {i} with a long title"),
            description: if i == 1 { Some("Haggle with an auto driver".into()) } else { None },
        })
        .collect();
    let p = list_payload("919845012345", "Choose", "Scenarios", &items);
    let rows = p["interactive"]["action"]["sections"][0]["rows"]
        .as_array()
        .unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows[0]["title"].as_str().unwrap().chars().count() <= 24);
    assert_eq!(rows[0]["description"], "Haggle with an auto driver");
    assert!(rows[1].get("description").is_none());
    assert_eq!(p["interactive"]["action"]["button"], "Scenarios");
}

#[test]
fn test_text_payload_shape() {
    let p = text_payload("919845012345", "Namaskara");
    assert_eq!(p["type"], "text");
    assert_eq!(p["text"]["body"], "Namaskara");
    assert_eq!(p["to"], "919845012345");
}

#[test]
fn test_messages_url_uses_version_and_phone_id() {
    let cfg = WhatsAppConfig {
        phone_number_id: "1234".into(),
        ..Default::default()
    };
    let adapter = WhatsAppAdapter::new(cfg);
    assert_eq!(
        adapter.messages_url(),
        "https://graph.facebook.com/v22.0/1234/messages"
    );
    assert_eq!(adapter.platform(), Platform::WhatsApp);
}

#[tokio::test]
async fn test_send_to_unreachable_host_is_channel_error() {
    let cfg = WhatsAppConfig {
        phone_number_id: "1234".into(),
        ..Default::default()
    };
    let adapter = WhatsAppAdapter::with_base_url(cfg, "http://127.0.0.1:9");
    let err = adapter.send_text("919845012345", "hi").await.unwrap_err();
    assert!(matches!(err, chatlingo_core::error::ChatlingoError::Channel(_)));
}
