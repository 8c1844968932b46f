//! Append-only history log.

use super::{parse_timestamp, Store};
use chatlingo_core::{
    error::ChatlingoError,
    model::{HistoryEntry, Mode, Role},
};

type MessageRow = (
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<String>,
    String,
);

fn row_to_entry(row: MessageRow) -> Result<HistoryEntry, ChatlingoError> {
    let (user_key, role, content, mode, scenario_id, session_id, created_at) = row;
    Ok(HistoryEntry {
        role: role
            .parse::<Role>()
            .map_err(|e| ChatlingoError::Memory(e.to_string()))?,
        mode: mode
            .parse::<Mode>()
            .map_err(|e| ChatlingoError::Memory(e.to_string()))?,
        user_key,
        content,
        scenario_id,
        session_id,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Newest-first rows back into chronological order.
fn chronological(mut rows: Vec<MessageRow>) -> Result<Vec<HistoryEntry>, ChatlingoError> {
    rows.reverse();
    rows.into_iter().map(row_to_entry).collect()
}

impl Store {
    /// Append one turn to the log.
    pub async fn append_message(
        &self,
        user_key: &str,
        role: Role,
        content: &str,
        mode: Mode,
        session_id: Option<&str>,
        scenario_id: Option<i64>,
    ) -> Result<(), ChatlingoError> {
        sqlx::query(
            "INSERT INTO messages (user_key, role, content, mode, scenario_id, session_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_key)
        .bind(role.as_str())
        .bind(content)
        .bind(mode.as_str())
        .bind(scenario_id)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("insert failed: {e}")))?;
        Ok(())
    }

    /// The `limit` newest entries for a user, oldest first.
    ///
    /// With `session_id`, only that session's entries are considered.
    pub async fn recent_messages(
        &self,
        user_key: &str,
        limit: u32,
        session_id: Option<&str>,
    ) -> Result<Vec<HistoryEntry>, ChatlingoError> {
        let rows: Vec<MessageRow> = match session_id {
            Some(session) => sqlx::query_as::<_, MessageRow>(
                "SELECT user_key, role, content, mode, scenario_id, session_id, created_at \
                 FROM messages WHERE user_key = ? AND session_id = ? \
                 ORDER BY created_at DESC, id DESC LIMIT ?",
            )
            .bind(user_key)
            .bind(session)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, MessageRow>(
                "SELECT user_key, role, content, mode, scenario_id, session_id, created_at \
                 FROM messages WHERE user_key = ? \
                 ORDER BY created_at DESC, id DESC LIMIT ?",
            )
            .bind(user_key)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| ChatlingoError::Memory(format!("select history failed: {e}")))?;

        chronological(rows)
    }

    /// The `limit` newest entries written in `mode`, oldest first.
    pub async fn recent_messages_for_mode(
        &self,
        user_key: &str,
        mode: Mode,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, ChatlingoError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT user_key, role, content, mode, scenario_id, session_id, created_at \
             FROM messages WHERE user_key = ? AND mode = ? \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_key)
        .bind(mode.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("select history failed: {e}")))?;

        chronological(rows)
    }

    /// Delete a user's whole history. Returns the number of entries removed.
    pub async fn clear_history(&self, user_key: &str) -> Result<u64, ChatlingoError> {
        let result = sqlx::query("DELETE FROM messages WHERE user_key = ?")
            .bind(user_key)
            .execute(&self.pool)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("delete history failed: {e}")))?;
        Ok(result.rows_affected())
    }

    /// Total number of logged turns.
    pub async fn message_count(&self) -> Result<i64, ChatlingoError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("count messages failed: {e}")))?;
        Ok(count)
    }
}
