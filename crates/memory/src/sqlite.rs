//! SQLite memory store.
//!
//! One database file with two tables:
//! - `chat_history` — append-only conversation turns
//! - `facts` — key/value long-term facts about the user, upserted by key
//!
//! The history window and the fact summary are both read back as flat text
//! for prompt injection; callers never see rows.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use alfred_core::error::MemoryError;
use alfred_core::memory::{HistoryTurn, MemoryProvider, Speaker};

/// A durable memory provider backed by a SQLite file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database in tests.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite memory store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_history (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                speaker    TEXT NOT NULL,
                content    TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("chat_history table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS facts (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("facts table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryTurn, MemoryError> {
        let speaker: String = row
            .try_get("speaker")
            .map_err(|e| MemoryError::QueryFailed(format!("speaker column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        let speaker = match speaker.as_str() {
            "user" => Speaker::User,
            _ => Speaker::Agent,
        };
        let timestamp = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(HistoryTurn { speaker, content, timestamp })
    }
}

#[async_trait]
impl MemoryProvider for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryTurn>, MemoryError> {
        // Take the newest N rows, then flip back to chronological order.
        let rows = sqlx::query(
            r#"
            SELECT speaker, content, created_at FROM (
                SELECT id, speaker, content, created_at
                FROM chat_history ORDER BY id DESC LIMIT ?1
            ) ORDER BY id ASC
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("history window: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }

    async fn fact_summary(&self) -> Result<String, MemoryError> {
        let rows = sqlx::query("SELECT key, value FROM facts ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("fact summary: {e}")))?;

        let lines: Vec<String> = rows
            .iter()
            .map(|row| {
                let key: String = row
                    .try_get("key")
                    .map_err(|e| MemoryError::QueryFailed(format!("key column: {e}")))?;
                let value: String = row
                    .try_get("value")
                    .map_err(|e| MemoryError::QueryFailed(format!("value column: {e}")))?;
                Ok(format!("- {key}: {value}"))
            })
            .collect::<Result<_, MemoryError>>()?;

        Ok(lines.join("\n"))
    }

    async fn record_turn(&self, turn: HistoryTurn) -> Result<(), MemoryError> {
        let speaker = match turn.speaker {
            Speaker::User => "user",
            Speaker::Agent => "agent",
        };
        sqlx::query("INSERT INTO chat_history (speaker, content, created_at) VALUES (?1, ?2, ?3)")
            .bind(speaker)
            .bind(&turn.content)
            .bind(turn.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("record turn: {e}")))?;

        Ok(())
    }

    async fn remember_fact(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT INTO facts (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("remember fact: {e}")))?;

        debug!("Stored fact '{key}'");
        Ok(())
    }
}
