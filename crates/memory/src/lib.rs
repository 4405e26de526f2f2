//! Memory backends for alfred.
//!
//! Two implementations of `alfred_core::memory::MemoryProvider`:
//! - `InMemoryStore` — process-local, used in tests and as a fallback
//! - `SqliteStore` — durable chat history and facts in a SQLite file

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
