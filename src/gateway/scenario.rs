//! Roleplay flow: start, converse, exit.

use super::{short_key, Gateway};
use chatlingo_core::{
    context::{ChatTurn, CompletionProfile},
    error::ChatlingoError,
    model::{Mode, Role, Scenario, User},
    traits::PlatformAdapter,
};
use tracing::{info, warn};
use uuid::Uuid;

impl Gateway {
    pub(super) fn scenario_prompt(&self, scenario: &Scenario) -> String {
        self.prompts.render_scenario_system(
            &scenario.title,
            &scenario.bot_persona,
            &scenario.situation_seed,
        )
    }

    /// Begin a fresh run: new session, LLM-written opening, persisted before send.
    pub(super) async fn start_scenario(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        scenario_id: i64,
    ) -> Result<(), ChatlingoError> {
        let Some(scenario) = self.store.scenario_by_id(scenario_id).await? else {
            warn!(
                "engine: {} picked unknown scenario {scenario_id}",
                short_key(&user.user_key)
            );
            return self.scenario_not_found(user, adapter).await;
        };

        let session_id = Uuid::new_v4().to_string();
        self.store
            .update_mode(
                &user.user_key,
                Mode::PracticeScenario,
                Some(scenario.id),
                Some(&session_id),
            )
            .await?;
        info!(
            "engine: {} started scenario {} '{}'",
            short_key(&user.user_key),
            scenario.id,
            scenario.title
        );

        let opening = self
            .llm
            .complete(
                &self.scenario_prompt(&scenario),
                Vec::new(),
                CompletionProfile::Roleplay,
            )
            .await;

        self.store
            .append_message(
                &user.user_key,
                Role::Assistant,
                &opening,
                Mode::PracticeScenario,
                Some(&session_id),
                Some(scenario.id),
            )
            .await?;
        adapter.send_text(&user.contact, &opening).await
    }

    /// One roleplay exchange, with history scoped to the current session.
    pub(super) async fn scenario_turn(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
        text: &str,
    ) -> Result<(), ChatlingoError> {
        let (Some(scenario_id), Some(session_id)) =
            (user.current_scenario_id, user.current_session_id.as_deref())
        else {
            return self.scenario_not_found(user, adapter).await;
        };
        let Some(scenario) = self.store.scenario_by_id(scenario_id).await? else {
            warn!(
                "engine: scenario {scenario_id} vanished mid-run for {}",
                short_key(&user.user_key)
            );
            return self.scenario_not_found(user, adapter).await;
        };

        self.store
            .append_message(
                &user.user_key,
                Role::User,
                text,
                Mode::PracticeScenario,
                Some(session_id),
                Some(scenario_id),
            )
            .await?;

        let history: Vec<ChatTurn> = self
            .store
            .recent_messages(
                &user.user_key,
                self.memory_config.scenario_history_limit,
                Some(session_id),
            )
            .await?
            .iter()
            .map(ChatTurn::from)
            .collect();

        let reply = self
            .llm
            .complete(
                &self.scenario_prompt(&scenario),
                history,
                CompletionProfile::Roleplay,
            )
            .await;

        self.store
            .append_message(
                &user.user_key,
                Role::Assistant,
                &reply,
                Mode::PracticeScenario,
                Some(session_id),
                Some(scenario_id),
            )
            .await?;
        adapter.send_text(&user.contact, &reply).await
    }

    /// Record progress on the scenario the user is leaving, if any.
    pub(super) async fn close_scenario(&self, user: &User) -> Result<(), ChatlingoError> {
        if user.current_mode != Mode::PracticeScenario {
            return Ok(());
        }
        if let Some(scenario_id) = user.current_scenario_id {
            self.store
                .mark_scenario_complete(&user.user_key, scenario_id)
                .await?;
            info!(
                "engine: {} finished scenario {scenario_id}",
                short_key(&user.user_key)
            );
        }
        Ok(())
    }

    /// Leave the roleplay: record progress, acknowledge, back to the menu.
    pub(super) async fn exit_scenario(
        &self,
        user: &User,
        adapter: &dyn PlatformAdapter,
    ) -> Result<(), ChatlingoError> {
        self.close_scenario(user).await?;
        adapter
            .send_text(&user.contact, &self.prompts.scenario_exit)
            .await?;
        self.reset_to_menu(user, adapter).await
    }
}
