//! Mode-first routing: one inbound event plus the user's mode becomes a [`Route`].
//!
//! Pure and synchronous. All side effects live in the flow handlers.

use chatlingo_core::{config::StartBehavior, message::InboundKind, model::Mode};

use super::keywords::*;

/// What the engine should do with one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Route {
    /// Clear pointers and show the menu.
    Reset,
    /// List the scenario catalogue.
    ShowScenarios,
    /// Begin a fresh run of a scenario.
    StartScenario(i64),
    /// A `scenario_` payload whose id did not parse.
    InvalidSelection(String),
    StartRandomChat,
    /// The daily-lesson button: resume the cursor, or day 1.
    StartLesson,
    /// `day N`, not yet range-checked.
    Day(i64),
    /// A greeting from a user already in the curriculum.
    ReturningGreeting,
    ExitScenario,
    ScenarioTurn(String),
    ChatTurn(String),
    LessonTurn(String),
    /// Free text in the menu.
    MenuText,
    /// Unknown payload or empty text; logged and dropped.
    Ignore(String),
}

/// Route an event for a user currently in `mode`.
pub(super) fn route(kind: &InboundKind, mode: Mode, start_behavior: StartBehavior) -> Route {
    match kind {
        InboundKind::Button(id) | InboundKind::ListSelection(id) => route_payload(id.trim()),
        InboundKind::Text(text) => route_text(text, mode, start_behavior),
    }
}

fn route_text(text: &str, mode: Mode, start_behavior: StartBehavior) -> Route {
    let command = normalize_command(text);
    if command.is_empty() {
        return Route::Ignore("empty text".into());
    }

    if let Some(day) = parse_day_command(&command) {
        return Route::Day(day);
    }

    if start_behavior == StartBehavior::DayOne {
        if command == "start" {
            return Route::Day(1);
        }
        if mode == Mode::DayCurriculum && is_greeting(&command) {
            return Route::ReturningGreeting;
        }
    }

    if is_global_reset(&command) {
        return Route::Reset;
    }

    let text = text.trim().to_string();
    match mode {
        Mode::PracticeScenario if is_scenario_exit(&command) => Route::ExitScenario,
        Mode::PracticeScenario => Route::ScenarioTurn(text),
        Mode::RandomChat => Route::ChatTurn(text),
        Mode::DayCurriculum => Route::LessonTurn(text),
        // Payload ids typed back as text (SMS, web) count as selections.
        Mode::Menu => match route_payload(&command) {
            Route::Ignore(_) => Route::MenuText,
            selected => selected,
        },
    }
}

fn route_payload(id: &str) -> Route {
    match id {
        PAYLOAD_PRACTICE | PAYLOAD_PRACTICE_LEGACY => Route::ShowScenarios,
        PAYLOAD_RANDOM_CHAT => Route::StartRandomChat,
        PAYLOAD_DAILY_LESSON => Route::StartLesson,
        PAYLOAD_MENU => Route::Reset,
        other => match other.strip_prefix(SCENARIO_PREFIX) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(scenario_id) => Route::StartScenario(scenario_id),
                Err(_) => Route::InvalidSelection(other.to_string()),
            },
            None => Route::Ignore(format!("unknown payload '{other}'")),
        },
    }
}
