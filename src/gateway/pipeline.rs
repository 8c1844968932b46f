//! One inbound event from arrival to reply.

use super::{routing::route, routing::Route, short_key, Gateway};
use chatlingo_core::{
    error::ChatlingoError, identity, message::InboundEvent, model::Mode, model::Platform,
    model::User, traits::PlatformAdapter,
};
use tracing::{debug, info, warn};

impl Gateway {
    /// Process one inbound event end to end.
    ///
    /// LLM failures never surface here (the gateway substitutes fallback
    /// text). Store and transport errors propagate to the caller.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), ChatlingoError> {
        let adapter = self.adapter(event.platform)?;
        let (user_key, contact) = identity::resolve(event.platform, &event.sender);

        if !self.is_authorized(event.platform, &contact) {
            warn!(
                "engine: unauthorized {} user {}",
                event.platform,
                short_key(&user_key)
            );
            return adapter
                .send_text(&contact, &self.auth_config.deny_message)
                .await;
        }

        let _guard = self.locks.acquire(&user_key).await;
        let user = self
            .store
            .get_or_create(&user_key, event.platform, &contact)
            .await?;

        let route = route(
            &event.kind,
            user.current_mode,
            self.curriculum_config.start_behavior,
        );
        debug!(
            "engine: {} in {} -> {:?}",
            short_key(&user.user_key),
            user.current_mode,
            route
        );

        self.dispatch(&user, adapter.as_ref(), route).await
    }

    async fn dispatch(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        route: Route,
    ) -> Result<(), ChatlingoError> {
        match route {
            Route::Reset if user.current_mode == Mode::PracticeScenario => {
                self.exit_scenario(user, adapter).await
            }
            Route::Reset => self.reset_to_menu(user, adapter).await,
            Route::MenuText => self.send_menu(user, adapter).await,
            Route::ShowScenarios => self.show_scenarios(user, adapter).await,
            Route::StartScenario(scenario_id) => {
                self.start_scenario(user, adapter, scenario_id).await
            }
            Route::InvalidSelection(raw) => {
                warn!(
                    "engine: {} sent malformed selection '{raw}'",
                    short_key(&user.user_key)
                );
                self.scenario_not_found(user, adapter).await
            }
            Route::ExitScenario => self.exit_scenario(user, adapter).await,
            Route::ScenarioTurn(text) => self.scenario_turn(user, adapter, &text).await,
            Route::StartRandomChat => self.start_random_chat(user, adapter).await,
            Route::ChatTurn(text) => self.chat_turn(user, adapter, &text).await,
            Route::StartLesson => {
                let day = user
                    .day_number
                    .filter(|d| self.curriculum.contains(*d))
                    .unwrap_or(1);
                self.start_lesson(user, adapter, day).await
            }
            Route::Day(day) => {
                self.close_scenario(user).await?;
                self.start_lesson(user, adapter, day).await
            }
            Route::ReturningGreeting => self.returning_greeting(user, adapter).await,
            Route::LessonTurn(text) => self.lesson_turn(user, adapter, &text).await,
            Route::Ignore(reason) => {
                info!(
                    "engine: ignoring event from {} ({reason})",
                    short_key(&user.user_key)
                );
                Ok(())
            }
        }
    }

    /// Clear a user's history and put them back in the menu.
    ///
    /// Returns the number of history entries removed.
    pub async fn reset_user(&self, platform: Platform, sender: &str) -> Result<u64, ChatlingoError> {
        let (user_key, contact) = identity::resolve(platform, sender);
        let _guard = self.locks.acquire(&user_key).await;
        self.store
            .get_or_create(&user_key, platform, &contact)
            .await?;
        self.store
            .update_mode(&user_key, Mode::Menu, None, None)
            .await?;
        self.store.set_day_number(&user_key, None).await?;
        let removed = self.store.clear_history(&user_key).await?;
        info!(
            "engine: reset {} ({removed} entries cleared)",
            short_key(&user_key)
        );
        Ok(removed)
    }
}
