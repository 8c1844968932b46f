//! Roleplay catalogue and per-user scenario progress.

use super::Store;
use chatlingo_core::{error::ChatlingoError, model::Scenario};

type ScenarioRow = (i64, String, String, String, String);

fn row_to_scenario((id, title, bot_persona, situation_seed, opening_line): ScenarioRow) -> Scenario {
    Scenario {
        id,
        title,
        bot_persona,
        situation_seed,
        opening_line,
    }
}

impl Store {
    /// All scenarios, by id.
    pub async fn all_scenarios(&self) -> Result<Vec<Scenario>, ChatlingoError> {
        let rows: Vec<ScenarioRow> = sqlx::query_as(
            "SELECT id, title, bot_persona, situation_seed, opening_line \
             FROM scenarios ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("select scenarios failed: {e}")))?;
        Ok(rows.into_iter().map(row_to_scenario).collect())
    }

    pub async fn scenario_by_id(&self, id: i64) -> Result<Option<Scenario>, ChatlingoError> {
        let row: Option<ScenarioRow> = sqlx::query_as(
            "SELECT id, title, bot_persona, situation_seed, opening_line \
             FROM scenarios WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("select scenario failed: {e}")))?;
        Ok(row.map(row_to_scenario))
    }

    /// Insert or replace scenarios by id. Returns how many were written.
    pub async fn upsert_scenarios(&self, scenarios: &[Scenario]) -> Result<usize, ChatlingoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChatlingoError::Memory(format!("begin failed: {e}")))?;

        for s in scenarios {
            sqlx::query(
                "INSERT INTO scenarios (id, title, bot_persona, situation_seed, opening_line) \
                 VALUES (?, ?, ?, ?, ?) \
                 ON CONFLICT(id) DO UPDATE SET \
                   title = excluded.title, \
                   bot_persona = excluded.bot_persona, \
                   situation_seed = excluded.situation_seed, \
                   opening_line = excluded.opening_line",
            )
            .bind(s.id)
            .bind(&s.title)
            .bind(&s.bot_persona)
            .bind(&s.situation_seed)
            .bind(&s.opening_line)
            .execute(&mut *tx)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("upsert scenario {} failed: {e}", s.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| ChatlingoError::Memory(format!("commit failed: {e}")))?;
        Ok(scenarios.len())
    }

    /// Record that the user finished a run of `scenario_id`.
    pub async fn mark_scenario_complete(
        &self,
        user_key: &str,
        scenario_id: i64,
    ) -> Result<(), ChatlingoError> {
        sqlx::query(
            "INSERT INTO scenario_progress (user_key, scenario_id) VALUES (?, ?) \
             ON CONFLICT(user_key, scenario_id) DO UPDATE SET \
               status = 'completed', \
               runs = runs + 1, \
               completed_at = strftime('%Y-%m-%d %H:%M:%f', 'now')",
        )
        .bind(user_key)
        .bind(scenario_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("update progress failed: {e}")))?;
        Ok(())
    }

    /// `(scenario_id, runs)` for every scenario the user has finished.
    pub async fn completed_scenarios(
        &self,
        user_key: &str,
    ) -> Result<Vec<(i64, i64)>, ChatlingoError> {
        sqlx::query_as(
            "SELECT scenario_id, runs FROM scenario_progress \
             WHERE user_key = ? AND status = 'completed' ORDER BY scenario_id",
        )
        .bind(user_key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("select progress failed: {e}")))
    }
}
