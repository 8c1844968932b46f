use crate::{
    context::CompletionRequest,
    error::ChatlingoError,
    message::{MenuButton, MenuItem},
    model::Platform,
};
use async_trait::async_trait;

/// LLM provider trait: the brain.
///
/// Every chat-completion backend (OpenAI, OpenRouter) implements this trait
/// to provide a uniform interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Whether the credentials this provider needs are present.
    fn has_credentials(&self) -> bool;

    /// Send a request to the provider and get the reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ChatlingoError>;
}

/// Platform adapter trait: the mouth.
///
/// Every transport (WhatsApp, Telegram, SMS) implements these three sends.
/// `user_id` is the platform address (phone number, chat id), not the hashed key.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Which platform this adapter delivers to.
    fn platform(&self) -> Platform;

    /// Send a plain text message.
    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), ChatlingoError>;

    /// Send a message with up to three reply buttons.
    async fn send_menu_buttons(
        &self,
        user_id: &str,
        text: &str,
        buttons: &[MenuButton],
    ) -> Result<(), ChatlingoError>;

    /// Send a message with a selectable list of up to ten rows.
    async fn send_menu_list(
        &self,
        user_id: &str,
        text: &str,
        button_label: &str,
        items: &[MenuItem],
    ) -> Result<(), ChatlingoError>;
}
