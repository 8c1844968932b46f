//! Daily nudge: an LLM-written re-engagement message pushed to every user
//! once a day.

use super::{short_key, Gateway};
use chatlingo_core::{
    context::{ChatTurn, CompletionProfile},
    error::ChatlingoError,
    model::{Mode, Platform, Role, User},
    traits::PlatformAdapter,
};
use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NudgeReport {
    /// Users loaded from the store.
    pub users: usize,
    pub sent: usize,
    pub failed: usize,
    /// Users on transports that cannot be pushed to (web).
    pub skipped: usize,
}

/// Parse the configured `HH:MM` (UTC) fire time.
pub fn parse_nudge_time(raw: &str) -> Result<NaiveTime, ChatlingoError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| ChatlingoError::Config(format!("invalid nudge time '{raw}': {e}")))
}

/// The next instant strictly after `now` whose UTC wall clock reads `at`.
pub fn next_fire(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(at).and_utc())
            .unwrap_or(today)
    }
}

/// What one nudge is built from.
struct NudgePlan {
    system_prompt: String,
    profile: CompletionProfile,
    /// Recent history plus the nudge cue as the final turn.
    history: Vec<ChatTurn>,
    /// The rendered template, sent as-is when the LLM is unavailable.
    template: String,
    session_id: Option<String>,
    scenario_id: Option<i64>,
}

impl Gateway {
    /// Pick the nudge from the user's cursors: an active scenario first, then
    /// the day cursor, then the new-user invite.
    ///
    /// A day cursor outside the curriculum is an error for that user.
    async fn nudge_plan(&self, user: &User) -> Result<NudgePlan, ChatlingoError> {
        if let (Mode::PracticeScenario, Some(scenario_id), Some(session_id)) = (
            user.current_mode,
            user.current_scenario_id,
            user.current_session_id.as_deref(),
        ) {
            if let Some(scenario) = self.store.scenario_by_id(scenario_id).await? {
                let template = self.prompts.render_nudge_scenario(&scenario.title);
                let mut history: Vec<ChatTurn> = self
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
                history.push(ChatTurn::user(self.prompts.render_nudge_cue(&template)));
                return Ok(NudgePlan {
                    system_prompt: self.scenario_prompt(&scenario),
                    profile: CompletionProfile::Roleplay,
                    history,
                    template,
                    session_id: Some(session_id.to_string()),
                    scenario_id: Some(scenario_id),
                });
            }
        }

        let template = match user.day_number {
            Some(day) => {
                let entry = self.curriculum.day(day)?;
                self.prompts.render_nudge_day(entry.number, &entry.title)
            }
            None => self.prompts.nudge_new.clone(),
        };
        let mut history: Vec<ChatTurn> = self
            .store
            .recent_messages_for_mode(
                &user.user_key,
                user.current_mode,
                self.memory_config.chat_history_limit,
            )
            .await?
            .iter()
            .map(ChatTurn::from)
            .collect();
        history.push(ChatTurn::user(self.prompts.render_nudge_cue(&template)));
        Ok(NudgePlan {
            system_prompt: self.prompts.chat_system.clone(),
            profile: CompletionProfile::Chat,
            history,
            template,
            session_id: None,
            scenario_id: None,
        })
    }

    /// Nudge one user: have the LLM write it from their cursor, send, then
    /// record it as an assistant turn in their current mode so the next
    /// reply has context.
    pub async fn nudge_user(&self, user_key: &str) -> Result<(), ChatlingoError> {
        let _guard = self.locks.acquire(user_key).await;
        let user = self
            .store
            .get_user(user_key)
            .await?
            .ok_or_else(|| ChatlingoError::Memory(format!("no user {user_key}")))?;
        let adapter = self.adapter(user.platform)?;

        let plan = self.nudge_plan(&user).await?;
        let text = match self
            .llm
            .try_complete(&plan.system_prompt, plan.history, plan.profile)
            .await
        {
            Ok(text) => text,
            Err(_) => {
                warn!(
                    "nudge: {} gets the plain template",
                    short_key(&user.user_key)
                );
                plan.template
            }
        };

        adapter.send_text(&user.contact, &text).await?;
        self.store
            .append_message(
                &user.user_key,
                Role::Assistant,
                &text,
                user.current_mode,
                plan.session_id.as_deref(),
                plan.scenario_id,
            )
            .await
    }

    /// Nudge every user with at most `max_concurrency` in flight.
    ///
    /// Per-user failures are logged and counted; they never stop the sweep.
    pub async fn run_nudge_sweep(
        self: &Arc<Self>,
        max_concurrency: usize,
    ) -> Result<NudgeReport, ChatlingoError> {
        let users = self.store.all_users().await?;
        let mut report = NudgeReport {
            users: users.len(),
            ..Default::default()
        };
        info!(
            "nudge: sweep starting | users: {} | concurrency: {}",
            users.len(),
            max_concurrency.max(1)
        );

        let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for user in users {
            if user.platform == Platform::Web {
                report.skipped += 1;
                continue;
            }
            let permit = match permits.clone().acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    error!("nudge: worker pool closed: {e}");
                    break;
                }
            };
            let gateway = Arc::clone(self);
            tasks.spawn(async move {
                let _permit = permit;
                match gateway.nudge_user(&user.user_key).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!("nudge: {} failed: {e}", short_key(&user.user_key));
                        false
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.sent += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    error!("nudge: worker panicked: {e}");
                    report.failed += 1;
                }
            }
        }

        info!(
            "nudge: sweep done | sent: {} | failed: {} | skipped: {}",
            report.sent, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Background task: run the sweep once a day at `at` (UTC).
    pub async fn nudge_loop(self: Arc<Self>, at: NaiveTime, max_concurrency: usize) {
        loop {
            let now = Utc::now();
            let fire = next_fire(now, at);
            info!("nudge: next sweep at {}", fire.format("%Y-%m-%d %H:%M UTC"));
            let wait = (fire - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if let Err(e) = self.run_nudge_sweep(max_concurrency).await {
                warn!("nudge: sweep aborted: {e}");
            }
        }
    }
}
