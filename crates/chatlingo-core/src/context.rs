use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, Role};

/// A single turn of conversation history handed to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&HistoryEntry> for ChatTurn {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            role: entry.role,
            content: entry.content.clone(),
        }
    }
}

/// Sampling budget for a completion.
///
/// Roleplay runs hotter and longer than general chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionProfile {
    Chat,
    Roleplay,
}

impl CompletionProfile {
    pub fn temperature(&self) -> f32 {
        match self {
            Self::Chat => 0.7,
            Self::Roleplay => 0.8,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Chat => 150,
            Self::Roleplay => 200,
        }
    }
}

/// A structured message for OpenAI-compatible APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// Everything a provider needs for one completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Conversation history (oldest first). May be empty (openings, greetings).
    pub history: Vec<ChatTurn>,
    pub profile: CompletionProfile,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, history: Vec<ChatTurn>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
            profile: CompletionProfile::Chat,
            model: None,
        }
    }

    pub fn with_profile(mut self, profile: CompletionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Convert to OpenAI-format messages, system prompt first.
    pub fn to_api_messages(&self) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            });
        }
        for turn in &self.history {
            messages.push(ApiMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }
        messages
    }
}
