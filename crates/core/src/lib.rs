//! # Alfred Core
//!
//! Domain types, traits, and error definitions for the alfred agent runtime.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the reasoning loop is defined as a trait
//! here: the completion backend, the tool surface, the memory provider, the
//! status sink, and the persona source. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod context;
pub mod error;
pub mod memory;
pub mod persona;
pub mod provider;
pub mod status;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::{ContextEntry, EntryKind, TaskContext};
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use memory::{HistoryTurn, MemoryProvider, Speaker};
pub use persona::InstructionSource;
pub use provider::{CompletionBackend, CompletionRequest, CompletionResponse, ResponsePart, ToolDefinition};
pub use status::{NullSink, StatusSink};
pub use tool::{Tool, ToolInvocation, ToolRegistry};
