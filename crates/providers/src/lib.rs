//! Completion provider implementations for alfred.
//!
//! All backends implement the `alfred_core::CompletionBackend` trait.
//! The `RotatingClient` wraps a per-credential backend factory and the
//! shared `CredentialPool` to survive rate limits and key outages.

pub mod gemini;
pub mod pool;
pub mod rotating;

pub use gemini::GeminiBackend;
pub use pool::CredentialPool;
pub use rotating::RotatingClient;
