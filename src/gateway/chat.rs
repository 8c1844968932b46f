//! Random chat and the day-by-day curriculum.

use super::{short_key, Gateway};
use chatlingo_core::{
    config::ReturningGreeting,
    context::{ChatTurn, CompletionProfile},
    error::ChatlingoError,
    model::{Mode, Role, User},
    traits::PlatformAdapter,
};
use tracing::{info, warn};

impl Gateway {
    /// Switch to random chat and open with an LLM greeting.
    pub(super) async fn start_random_chat(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        self.store
            .update_mode(&user.user_key, Mode::RandomChat, None, None)
            .await?;

        let greeting = self
            .llm
            .complete(&self.prompts.chat_system, Vec::new(), CompletionProfile::Chat)
            .await;
        self.reply(user, adapter, Mode::RandomChat, &greeting).await
    }

    pub(super) async fn chat_turn(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        text: &str,
    ) -> Result<(), ChatlingoError> {
        self.exchange(user, adapter, Mode::RandomChat, text).await
    }

    /// Move the cursor to `day` and run its lesson prompt.
    ///
    /// An out-of-range day gets a corrective message and the menu.
    pub(super) async fn start_lesson(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        day: i64,
    ) -> Result<(), ChatlingoError> {
        let prompt = match self.curriculum.render_prompt(day) {
            Ok(p) => p,
            Err(e) => {
                warn!("engine: {} asked for {e}", short_key(&user.user_key));
                let msg = self.prompts.render_invalid_day(self.curriculum.last_day());
                adapter.send_text(&user.contact, &msg).await?;
                return self.reset_to_menu(user, adapter).await;
            }
        };

        self.store
            .update_mode(&user.user_key, Mode::DayCurriculum, None, None)
            .await?;
        self.store
            .set_day_number(&user.user_key, Some(day))
            .await?;
        info!("engine: {} on day {day}", short_key(&user.user_key));

        self.exchange(user, adapter, Mode::DayCurriculum, &prompt)
            .await
    }

    /// Greeting from a user already in the curriculum.
    pub(super) async fn returning_greeting(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        let current = user.day_number.filter(|d| self.curriculum.contains(*d));
        let day = match (self.curriculum_config.returning_greeting, current) {
            (_, None) => 1,
            (ReturningGreeting::Advance, Some(d)) => (d + 1).min(self.curriculum.last_day()),
            (ReturningGreeting::Remind, Some(d)) => d,
        };
        self.start_lesson(user, adapter, day).await
    }

    /// Free text inside a lesson goes to the LLM as-is.
    pub(super) async fn lesson_turn(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        text: &str,
    ) -> Result<(), ChatlingoError> {
        self.exchange(user, adapter, Mode::DayCurriculum, text)
            .await
    }

    /// Persist a user turn, complete over this mode's history, reply.
    async fn exchange(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        mode: Mode,
        text: &str,
    ) -> Result<(), ChatlingoError> {
        self.store
            .append_message(&user.user_key, Role::User, text, mode, None, None)
            .await?;

        let history: Vec<ChatTurn> = self
            .store
            .recent_messages_for_mode(
                &user.user_key,
                mode,
                self.memory_config.chat_history_limit,
            )
            .await?
            .iter()
            .map(ChatTurn::from)
            .collect();

        let reply = self
            .llm
            .complete(&self.prompts.chat_system, history, CompletionProfile::Chat)
            .await;
        self.reply(user, adapter, mode, &reply).await
    }

    /// Persist an assistant turn, then deliver it.
    async fn reply(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        mode: Mode,
        text: &str,
    ) -> Result<(), ChatlingoError> {
        self.store
            .append_message(&user.user_key, Role::Assistant, text, mode, None, None)
            .await?;
        adapter.send_text(&user.contact, text).await
    }
}
