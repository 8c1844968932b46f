//! # chatlingo-channels
//!
//! Messaging platform adapters for Chatlingo: outbound sends behind
//! [`PlatformAdapter`](chatlingo_core::traits::PlatformAdapter) and the
//! inbound payload parsers for each transport's webhook.

pub mod auth;
pub mod sms;
pub mod telegram;
pub mod web;
pub mod whatsapp;

/// Split text into chunks of at most `max_len` bytes, preferring newline
/// boundaries and never cutting inside a UTF-8 character.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max_len {
        let mut cut = max_len;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let split_at = rest[..cut].rfind('\n').filter(|&i| i > 0).unwrap_or(cut);
        chunks.push(rest[..split_at].to_string());
        rest = rest[split_at..].trim_start_matches('\n');
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
