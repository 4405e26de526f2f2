//! In-process memory store.
//!
//! Keeps turns and facts in a mutex-guarded struct. Used by tests and as
//! the fallback when no database path is configured. Nothing survives a
//! restart.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use alfred_core::error::MemoryError;
use alfred_core::memory::{HistoryTurn, MemoryProvider};

#[derive(Default)]
struct Inner {
    turns: Vec<HistoryTurn>,
    facts: BTreeMap<String, String>,
}

/// A volatile memory provider backed by process memory.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryProvider for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryTurn>, MemoryError> {
        let inner = self.inner.lock().map_err(|_| MemoryError::Storage("lock poisoned".into()))?;
        let start = inner.turns.len().saturating_sub(limit);
        Ok(inner.turns[start..].to_vec())
    }

    async fn fact_summary(&self) -> Result<String, MemoryError> {
        let inner = self.inner.lock().map_err(|_| MemoryError::Storage("lock poisoned".into()))?;
        Ok(inner
            .facts
            .iter()
            .map(|(k, v)| format!("- {k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn record_turn(&self, turn: HistoryTurn) -> Result<(), MemoryError> {
        let mut inner =
            self.inner.lock().map_err(|_| MemoryError::Storage("lock poisoned".into()))?;
        inner.turns.push(turn);
        Ok(())
    }

    async fn remember_fact(&self, key: &str, value: &str) -> Result<(), MemoryError> {
        let mut inner =
            self.inner.lock().map_err(|_| MemoryError::Storage("lock poisoned".into()))?;
        inner.facts.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfred_core::memory::Speaker;

    #[tokio::test]
    async fn records_and_limits_history() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.record_turn(HistoryTurn::user(format!("message {i}"))).await.unwrap();
        }

        let recent = store.recent_history(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "message 2");
        assert_eq!(recent[2].content, "message 4");
    }

    #[tokio::test]
    async fn history_keeps_speaker_order() {
        let store = InMemoryStore::new();
        store.record_turn(HistoryTurn::user("hi")).await.unwrap();
        store.record_turn(HistoryTurn::agent("hello")).await.unwrap();

        let recent = store.recent_history(10).await.unwrap();
        assert_eq!(recent[0].speaker, Speaker::User);
        assert_eq!(recent[1].speaker, Speaker::Agent);
    }

    #[tokio::test]
    async fn facts_upsert_by_key() {
        let store = InMemoryStore::new();
        store.remember_fact("favorite_editor", "vim").await.unwrap();
        store.remember_fact("favorite_editor", "helix").await.unwrap();
        store.remember_fact("name", "Sam").await.unwrap();

        let summary = store.fact_summary().await.unwrap();
        assert_eq!(summary, "- favorite_editor: helix\n- name: Sam");
    }

    #[tokio::test]
    async fn empty_store_yields_empty_summary() {
        let store = InMemoryStore::new();
        assert_eq!(store.fact_summary().await.unwrap(), "");
        assert!(store.recent_history(10).await.unwrap().is_empty());
    }
}
