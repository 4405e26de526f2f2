//! Credential pool — round-robin rotation over provider API keys.
//!
//! One pool is constructed at startup and shared by handle (`Arc`) with
//! every completion client in the process. The cursor is a relaxed atomic:
//! concurrent tasks may occasionally grab the same key (a lost update is
//! harmless), but the modulo guarantees the index is never out of range.

use std::sync::atomic::{AtomicUsize, Ordering};

/// An ordered set of provider credentials with a cyclic rotation cursor.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Build a pool from an ordered key list. Empty keys are dropped.
    pub fn new(keys: Vec<String>) -> Self {
        let keys: Vec<String> = keys.into_iter().filter(|k| !k.trim().is_empty()).collect();
        Self { keys, cursor: AtomicUsize::new(0) }
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Take the next credential, advancing the cursor.
    ///
    /// Returns `None` only for an empty pool.
    pub fn next_key(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(&self.keys[i])
    }

    /// How many times the cursor has advanced since startup.
    pub fn rotations(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}
