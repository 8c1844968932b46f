use super::Gateway;
use chatlingo_channels::auth::{phone_allowed, telegram_allowed};
use chatlingo_core::model::Platform;

impl Gateway {
    /// Whether `contact` (a normalized address) may talk to the bot on `platform`.
    ///
    /// A transport with no configuration section admits everyone. The web
    /// surface has no allow-list.
    pub(super) fn is_authorized(&self, platform: Platform, contact: &str) -> bool {
        if !self.auth_config.enabled {
            return true;
        }
        match platform {
            Platform::WhatsApp => self
                .channel_config
                .whatsapp
                .as_ref()
                .is_none_or(|c| phone_allowed(&c.allowed_users, contact)),
            Platform::Telegram => self
                .channel_config
                .telegram
                .as_ref()
                .is_none_or(|c| telegram_allowed(&c.allowed_users, contact)),
            Platform::Sms => self
                .channel_config
                .sms
                .as_ref()
                .is_none_or(|c| phone_allowed(&c.allowed_users, contact)),
            Platform::Web => true,
        }
    }
}
