//! The alfred reasoning loop.
//!
//! `AgentLoop` drives one task through a bounded think/act/observe cycle:
//! completion request, at most one tool execution per pass, one reflector
//! correction per failing shell command, and a hard iteration ceiling.

pub mod classifier;
pub mod delegate;
pub mod loop_runner;
pub mod persona;
pub mod reflector;
pub mod status;

pub use classifier::{classify_shell_output, ShellOutcome};
pub use delegate::DelegateTool;
pub use loop_runner::{AgentLoop, ABORT_TEXT, SHELL_TOOL};
pub use persona::PersonaBook;
pub use reflector::{CommandReflector, ProviderReflector};
pub use status::status_message;
