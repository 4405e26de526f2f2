//! Status sink — best-effort progress notifications toward the frontend.
//!
//! The loop announces what it is about to do ("Searching the web...") so a
//! chat frontend can show activity. Delivery is best-effort by construction:
//! `notify` returns `()`, so a broken sink can never fail a task.

use async_trait::async_trait;

/// A best-effort notification target.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Deliver a short progress message. Implementations swallow their own
    /// delivery failures.
    async fn notify(&self, message: &str);
}

/// A sink that drops every message. Useful for tests and background tasks.
pub struct NullSink;

#[async_trait]
impl StatusSink for NullSink {
    async fn notify(&self, _message: &str) {}
}
