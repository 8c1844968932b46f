//! Per-user conversation state.

use super::{parse_timestamp, Store};
use chatlingo_core::{
    error::ChatlingoError,
    model::{Mode, Platform, User},
};

type UserRow = (
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<String>,
    Option<i64>,
    String,
    String,
);

const USER_COLUMNS: &str = "user_key, platform, contact, current_mode, current_scenario_id, \
     current_session_id, day_number, joined_at, last_active_at";

fn row_to_user(row: UserRow) -> Result<User, ChatlingoError> {
    let (key, platform, contact, mode, scenario_id, session_id, day_number, joined, active) = row;
    Ok(User {
        platform: platform
            .parse::<Platform>()
            .map_err(|e| ChatlingoError::Memory(format!("user {key}: {e}")))?,
        current_mode: mode
            .parse::<Mode>()
            .map_err(|e| ChatlingoError::Memory(format!("user {key}: {e}")))?,
        contact,
        current_scenario_id: scenario_id,
        current_session_id: session_id,
        day_number,
        joined_at: parse_timestamp(&joined)?,
        last_active_at: parse_timestamp(&active)?,
        user_key: key,
    })
}

impl Store {
    /// Fetch the user, creating it in `menu` mode if unseen.
    ///
    /// A single upsert statement, so concurrent first messages never create
    /// duplicates. Touches `last_active_at` and refreshes the contact address.
    pub async fn get_or_create(
        &self,
        user_key: &str,
        platform: Platform,
        contact: &str,
    ) -> Result<User, ChatlingoError> {
        sqlx::query(
            "INSERT INTO users (user_key, platform, contact) VALUES (?, ?, ?) \
             ON CONFLICT(user_key) DO UPDATE SET \
               contact = excluded.contact, \
               last_active_at = strftime('%Y-%m-%d %H:%M:%f', 'now')",
        )
        .bind(user_key)
        .bind(platform.as_str())
        .bind(contact)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("upsert user failed: {e}")))?;

        self.get_user(user_key)
            .await?
            .ok_or_else(|| ChatlingoError::Memory(format!("user {user_key} vanished after upsert")))
    }

    /// Fetch a user by key.
    pub async fn get_user(&self, user_key: &str) -> Result<Option<User>, ChatlingoError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_key = ?"))
                .bind(user_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| ChatlingoError::Memory(format!("select user failed: {e}")))?;
        row.map(row_to_user).transpose()
    }

    /// Set the user's mode and scenario/session pointers in one statement.
    ///
    /// Pointers are kept only for `practice_scenario`, which requires both.
    pub async fn update_mode(
        &self,
        user_key: &str,
        mode: Mode,
        scenario_id: Option<i64>,
        session_id: Option<&str>,
    ) -> Result<(), ChatlingoError> {
        let (scenario_id, session_id) = match mode {
            Mode::PracticeScenario => match (scenario_id, session_id) {
                (Some(s), Some(sess)) => (Some(s), Some(sess)),
                _ => {
                    return Err(ChatlingoError::Validation(
                        "practice_scenario needs a scenario and a session".into(),
                    ))
                }
            },
            _ => (None, None),
        };

        let result = sqlx::query(
            "UPDATE users SET current_mode = ?, current_scenario_id = ?, current_session_id = ?, \
             last_active_at = strftime('%Y-%m-%d %H:%M:%f', 'now') WHERE user_key = ?",
        )
        .bind(mode.as_str())
        .bind(scenario_id)
        .bind(session_id)
        .bind(user_key)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("update mode failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(ChatlingoError::Memory(format!("no user {user_key}")));
        }
        Ok(())
    }

    /// Move the curriculum cursor.
    pub async fn set_day_number(
        &self,
        user_key: &str,
        day_number: Option<i64>,
    ) -> Result<(), ChatlingoError> {
        sqlx::query("UPDATE users SET day_number = ? WHERE user_key = ?")
            .bind(day_number)
            .bind(user_key)
            .execute(&self.pool)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("update day failed: {e}")))?;
        Ok(())
    }

    /// Every known user, oldest first.
    pub async fn all_users(&self) -> Result<Vec<User>, ChatlingoError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY joined_at ASC, user_key ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("select users failed: {e}")))?;
        rows.into_iter().map(row_to_user).collect()
    }

    /// Number of known users.
    pub async fn user_count(&self) -> Result<i64, ChatlingoError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("count users failed: {e}")))?;
        Ok(count)
    }
}
