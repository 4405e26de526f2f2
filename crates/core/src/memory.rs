//! Memory provider trait — short-term turn history plus long-term facts.
//!
//! The reasoning loop treats both opaquely: the recent history and the fact
//! summary are rendered into the prompt verbatim. Storage backends (SQLite,
//! in-memory) implement this trait and handle their own concurrency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Agent => "Agent",
        }
    }
}

/// A single turn in the short-term conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { speaker: Speaker::User, content: content.into(), timestamp: Utc::now() }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self { speaker: Speaker::Agent, content: content.into(), timestamp: Utc::now() }
    }
}

/// Render turns into the flat history block injected into the prompt.
pub fn render_history(turns: &[HistoryTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.speaker.label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The memory provider trait.
///
/// Implementations: SQLite-backed store, in-memory store (tests, default).
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// The most recent turns, ordered oldest first.
    async fn recent_history(&self, limit: usize) -> std::result::Result<Vec<HistoryTurn>, MemoryError>;

    /// A flat long-term fact summary for prompt injection.
    /// Empty string when nothing is known.
    async fn fact_summary(&self) -> std::result::Result<String, MemoryError>;

    /// Append a conversation turn.
    async fn record_turn(&self, turn: HistoryTurn) -> std::result::Result<(), MemoryError>;

    /// Store or update a long-term fact about the user.
    async fn remember_fact(&self, key: &str, value: &str) -> std::result::Result<(), MemoryError>;
}
