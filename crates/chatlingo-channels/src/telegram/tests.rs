use super::*;
use chatlingo_core::{config::TelegramConfig, message::InboundKind, traits::PlatformAdapter};

fn update(json: &str) -> TgUpdate {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_parse_text_message() {
    let u = update(
        r#"{"update_id":1,"message":{"message_id":10,"from":{"id":42,"first_name":"Ravi","is_bot":false},"chat":{"id":42,"type":"private"},"date":0,"text":"/start"}}"#,
    );
    let event = parse_update(&u).unwrap();
    assert_eq!(event.platform, Platform::Telegram);
    assert_eq!(event.sender, "42");
    assert_eq!(event.kind, InboundKind::Text("/start".into()));
    assert_eq!(event.message_id.as_deref(), Some("10"));
    assert_eq!(event.sender_name.as_deref(), Some("Ravi"));
}

#[test]
fn test_parse_callback_query() {
    let u = update(
        r#"{"update_id":2,"callback_query":{"id":"cb-1","from":{"id":42,"first_name":"Ravi"},"message":{"message_id":11,"chat":{"id":-100},"text":"menu"},"data":"scenario_3"}}"#,
    );
    let event = parse_update(&u).unwrap();
    assert_eq!(event.sender, "-100");
    assert_eq!(event.kind, InboundKind::Button("scenario_3".into()));
    assert_eq!(event.message_id.as_deref(), Some("cb-1"));
}

#[test]
fn test_non_text_update_is_dropped() {
    let u = update(
        r#"{"update_id":3,"message":{"message_id":12,"chat":{"id":42},"photo":[]}}"#,
    );
    assert!(parse_update(&u).is_none());
    let u = update(r#"{"update_id":4,"edited_message":{}}"#);
    assert!(parse_update(&u).is_none());
}

#[test]
fn test_keyboard_payload_one_row_per_option() {
    let p = keyboard_payload(
        "42",
        "Pick",
        &[
            ("random_chat".into(), "☕ Random Chat".into()),
            ("daily_lesson".into(), "📅 Daily Lesson".into()),
        ],
    );
    let rows = p["reply_markup"]["inline_keyboard"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0]["callback_data"], "daily_lesson");
    assert_eq!(p["chat_id"], "42");
}

#[test]
fn test_secret_matching() {
    let open = TelegramAdapter::new(TelegramConfig::default());
    assert!(open.secret_matches(None));

    let locked = TelegramAdapter::new(TelegramConfig {
        webhook_secret: "s3cret".into(),
        ..Default::default()
    });
    assert!(locked.secret_matches(Some("s3cret")));
    assert!(!locked.secret_matches(Some("nope")));
    assert!(!locked.secret_matches(None));
    assert_eq!(locked.platform(), Platform::Telegram);
}

#[tokio::test]
async fn test_send_to_unreachable_host_is_channel_error() {
    let adapter = TelegramAdapter::with_api_url(TelegramConfig::default(), "http://127.0.0.1:9");
    assert!(adapter.send_text("42", "hi").await.is_err());
    assert!(adapter.answer_callback_query("cb").await.is_err());
}
