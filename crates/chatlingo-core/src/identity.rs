//! User identity: turns a platform address into a stable, opaque key.
//!
//! The key is the only join key used by the store. The normalized address is
//! kept separately (as a non-key attribute) so outbound delivery still works.

use sha2::{Digest, Sha256};

use crate::model::Platform;

/// Normalize a raw sender address for the given platform.
///
/// Strips transport prefixes (`whatsapp:`, `tel:`) and, for phone-based
/// platforms, drops formatting characters and a leading `+` so that
/// `+91 98450-12345` and `919845012345` map to the same user.
pub fn normalize_address(platform: Platform, raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("whatsapp:")
        .or_else(|| trimmed.strip_prefix("tel:"))
        .unwrap_or(trimmed)
        .trim();

    match platform {
        Platform::WhatsApp | Platform::Sms => stripped
            .trim_start_matches('+')
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect(),
        Platform::Telegram | Platform::Web => stripped.to_string(),
    }
}

/// Hash a normalized address into the opaque user key.
///
/// The platform is part of the preimage so identical ids on two transports
/// never collide.
pub fn user_key(platform: Platform, normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(platform.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize and hash in one step. Returns `(user_key, normalized_address)`.
pub fn resolve(platform: Platform, raw: &str) -> (String, String) {
    let normalized = normalize_address(platform, raw);
    (user_key(platform, &normalized), normalized)
}
