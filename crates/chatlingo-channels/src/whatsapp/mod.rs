//! WhatsApp Cloud API adapter.
//!
//! Outbound messages go to `POST /{api_version}/{phone_number_id}/messages`;
//! inbound messages arrive on the webhook and are parsed by [`parse_webhook`].
//! Docs: <https://developers.facebook.com/docs/whatsapp/cloud-api>

mod send;
mod webhook;

#[cfg(test)]
mod tests;

pub use send::{buttons_payload, list_payload, text_payload};
pub use webhook::{parse_webhook, verify_subscription};

use chatlingo_core::config::WhatsAppConfig;

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";

/// WhatsApp adapter backed by the Cloud API.
pub struct WhatsAppAdapter {
    config: WhatsAppConfig,
    client: reqwest::Client,
    messages_url: String,
}

impl WhatsAppAdapter {
    /// Create a new adapter from config.
    pub fn new(config: WhatsAppConfig) -> Self {
        Self::with_base_url(config, GRAPH_BASE_URL)
    }

    /// Create an adapter against a different Graph API host.
    pub fn with_base_url(config: WhatsAppConfig, base_url: &str) -> Self {
        let messages_url = format!(
            "{}/{}/{}/messages",
            base_url.trim_end_matches('/'),
            config.api_version,
            config.phone_number_id
        );
        Self {
            config,
            client: reqwest::Client::new(),
            messages_url,
        }
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}
