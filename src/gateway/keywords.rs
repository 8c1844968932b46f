//! Keyword and payload-id tables used by routing.

/// Words that reset any conversation back to the menu.
pub(super) const GLOBAL_RESET: &[&str] = &["menu", "hi", "hello", "start", "restart"];

/// Greetings that trigger the returning-user policy in day-one mode.
pub(super) const GREETINGS: &[&str] = &["hi", "hello"];

/// Words that end a roleplay. `menu` is handled by [`GLOBAL_RESET`] first.
pub(super) const SCENARIO_EXIT: &[&str] = &["exit", "quit", "stop", "menu", "end"];

/// Interactive payload ids.
pub(super) const PAYLOAD_PRACTICE: &str = "practice_scenario_start";
pub(super) const PAYLOAD_PRACTICE_LEGACY: &str = "roleplay_start";
pub(super) const PAYLOAD_RANDOM_CHAT: &str = "random_chat";
pub(super) const PAYLOAD_DAILY_LESSON: &str = "daily_lesson";
pub(super) const PAYLOAD_MENU: &str = "menu";
pub(super) const SCENARIO_PREFIX: &str = "scenario_";

/// Menu button labels.
pub(super) const BUTTON_PRACTICE: &str = "🎭 Practice";
pub(super) const BUTTON_RANDOM_CHAT: &str = "☕ Random Chat";
pub(super) const BUTTON_DAILY_LESSON: &str = "📅 Daily Lesson";

/// Lowercase, trim, and drop a leading `/` (Telegram's `/start`).
pub(super) fn normalize_command(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    match lowered.strip_prefix('/') {
        Some(rest) => rest.trim().to_string(),
        None => lowered,
    }
}

/// Match `day N` / `day-N` / `dayN`. Returns the raw number, unchecked.
pub(super) fn parse_day_command(normalized: &str) -> Option<i64> {
    let rest = normalized.strip_prefix("day")?;
    let digits = rest.trim_start_matches([' ', '-', '_']).trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok()
}

pub(super) fn is_global_reset(normalized: &str) -> bool {
    GLOBAL_RESET.contains(&normalized)
}

pub(super) fn is_greeting(normalized: &str) -> bool {
    GREETINGS.contains(&normalized)
}

pub(super) fn is_scenario_exit(normalized: &str) -> bool {
    SCENARIO_EXIT.contains(&normalized)
}
