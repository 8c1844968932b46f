use super::{keywords::*, Gateway};
use chatlingo_core::{
    error::ChatlingoError,
    message::{MenuButton, MenuItem, MAX_LIST_ITEMS},
    model::{Mode, User},
    traits::PlatformAdapter,
};

impl Gateway {
    /// The three top-level choices.
    pub(super) async fn send_menu(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        let buttons = [
            MenuButton::new(PAYLOAD_PRACTICE, BUTTON_PRACTICE),
            MenuButton::new(PAYLOAD_RANDOM_CHAT, BUTTON_RANDOM_CHAT),
            MenuButton::new(PAYLOAD_DAILY_LESSON, BUTTON_DAILY_LESSON),
        ];
        adapter
            .send_menu_buttons(&user.contact, &self.prompts.welcome, &buttons)
            .await
    }

    /// Drop scenario/session pointers, then show the menu.
    pub(super) async fn reset_to_menu(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        self.store
            .update_mode(&user.user_key, Mode::Menu, None, None)
            .await?;
        self.send_menu(user, adapter).await
    }

    /// Present the scenario catalogue as a list. The user stays in the menu
    /// until a row is picked.
    pub(super) async fn show_scenarios(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        self.store
            .update_mode(&user.user_key, Mode::Menu, None, None)
            .await?;

        let scenarios = self.store.all_scenarios().await?;
        if scenarios.is_empty() {
            return adapter
                .send_text(&user.contact, &self.prompts.no_scenarios)
                .await;
        }

        let items: Vec<MenuItem> = scenarios
            .into_iter()
            .take(MAX_LIST_ITEMS)
            .map(|s| MenuItem {
                id: format!("{SCENARIO_PREFIX}{}", s.id),
                title: s.title,
                description: Some(s.situation_seed),
            })
            .collect();

        adapter
            .send_menu_list(
                &user.contact,
                &self.prompts.scenario_list,
                &self.prompts.scenario_list_button,
                &items,
            )
            .await
    }

    /// Unknown or malformed scenario: say so, then back to the menu.
    pub(super) async fn scenario_not_found(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        adapter
            .send_text(&user.contact, &self.prompts.scenario_not_found)
            .await?;
        self.reset_to_menu(user, adapter).await
    }
}
