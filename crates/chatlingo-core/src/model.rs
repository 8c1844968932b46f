//! Domain records shared by the engine and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChatlingoError;

/// Messaging transport a user reaches us through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WhatsApp,
    Telegram,
    Sms,
    /// The synchronous web chat surface.
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsApp => "whatsapp",
            Self::Telegram => "telegram",
            Self::Sms => "sms",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ChatlingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(Self::WhatsApp),
            "telegram" => Ok(Self::Telegram),
            "sms" => Ok(Self::Sms),
            "web" => Ok(Self::Web),
            other => Err(ChatlingoError::Validation(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

/// The conversational state a user is in. Exactly one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Menu,
    RandomChat,
    PracticeScenario,
    DayCurriculum,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::RandomChat => "random_chat",
            Self::PracticeScenario => "practice_scenario",
            Self::DayCurriculum => "day_curriculum",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ChatlingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu" => Ok(Self::Menu),
            "random_chat" | "chat" => Ok(Self::RandomChat),
            "practice_scenario" | "roleplay" => Ok(Self::PracticeScenario),
            "day_curriculum" => Ok(Self::DayCurriculum),
            other => Err(ChatlingoError::Validation(format!("unknown mode '{other}'"))),
        }
    }
}

/// Author of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = ChatlingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            // Older rows used the provider's own naming.
            "assistant" | "model" | "bot" => Ok(Self::Assistant),
            other => Err(ChatlingoError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Per-user conversation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque hashed key: the only join key.
    pub user_key: String,
    pub platform: Platform,
    /// Normalized address used for outbound delivery.
    pub contact: String,
    pub current_mode: Mode,
    /// Set iff `current_mode` is `PracticeScenario`.
    pub current_scenario_id: Option<i64>,
    /// Set iff `current_mode` is `PracticeScenario`.
    pub current_session_id: Option<String>,
    /// Curriculum cursor.
    pub day_number: Option<i64>,
    pub joined_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// A roleplay scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: i64,
    pub title: String,
    pub bot_persona: String,
    pub situation_seed: String,
    pub opening_line: String,
}

/// One entry of the append-only message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_key: String,
    pub role: Role,
    pub content: String,
    pub mode: Mode,
    pub scenario_id: Option<i64>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
