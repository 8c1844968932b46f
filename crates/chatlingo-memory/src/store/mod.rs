//! SQLite-backed conversation store.
//!
//! Split into focused submodules:
//! - `users`: per-user state (mode, scenario/session pointers, day cursor)
//! - `messages`: the append-only history log and bounded history windows
//! - `scenarios`: the roleplay catalogue and per-user scenario progress

mod messages;
mod scenarios;
mod users;

#[cfg(test)]
mod tests;

use chatlingo_core::{config::MemoryConfig, error::ChatlingoError, shellexpand};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Timestamp format written by the schema defaults.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Persistent conversation store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at `config.db_path` and run migrations.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub async fn new(config: &MemoryConfig) -> Result<Self, ChatlingoError> {
        if config.db_path == ":memory:" {
            return Self::in_memory().await;
        }

        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChatlingoError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| ChatlingoError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("store: initialized at {db_path}");

        Ok(Self { pool })
    }

    /// A private in-memory database with migrations applied.
    ///
    /// Uses a single connection: every connection to `:memory:` is a separate
    /// database.
    pub async fn in_memory() -> Result<Self, ChatlingoError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| ChatlingoError::Memory(format!("invalid db path: {e}")))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| ChatlingoError::Memory(format!("failed to open sqlite: {e}")))?;
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), ChatlingoError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| ChatlingoError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_scenario_progress",
                include_str!("../../migrations/002_scenario_progress.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        ChatlingoError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| ChatlingoError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    ChatlingoError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

/// Parse a timestamp written by SQLite's `strftime` default.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ChatlingoError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| ChatlingoError::Memory(format!("bad timestamp '{raw}': {e}")))
}
