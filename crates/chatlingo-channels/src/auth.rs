//! Per-transport allow-lists. An empty list admits everyone.

/// Whether a normalized phone number is on the list.
///
/// List entries are compared after dropping a leading `+`, so
/// `"+919845012345"` and `"919845012345"` are the same entry.
pub fn phone_allowed(allowed: &[String], normalized: &str) -> bool {
    allowed.is_empty()
        || allowed
            .iter()
            .any(|a| a.trim().trim_start_matches('+') == normalized)
}

/// Whether a Telegram user/chat id is on the list.
pub fn telegram_allowed(allowed: &[i64], id: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    id.parse::<i64>()
        .map(|id| allowed.contains(&id))
        .unwrap_or(false)
}
