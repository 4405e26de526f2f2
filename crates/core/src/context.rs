//! Task context — the structured working log of one loop invocation.
//!
//! The reasoning loop appends structured entries (the initial instruction,
//! tool results, follow-up notes) as it works through a task. The log is
//! rendered to a flat prompt string only at the provider-call boundary and
//! is discarded when the loop terminates. It is exclusively owned by one
//! invocation — nothing here needs locking.

use serde::{Deserialize, Serialize};

/// What kind of entry was appended to the task context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// The initial task framing: memory, history, and the user's request.
    Instruction,
    /// Raw output of a tool execution.
    ToolResult,
    /// A structured follow-up note the loop addresses to the model.
    Note,
}

/// A single entry in the task context log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub kind: EntryKind,
    pub payload: String,
}

/// An ordered, append-only log of context entries for one task.
#[derive(Debug, Default)]
pub struct TaskContext {
    entries: Vec<ContextEntry>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append an entry. Entries are never mutated or removed.
    pub fn push(&mut self, kind: EntryKind, payload: impl Into<String>) {
        self.entries.push(ContextEntry { kind, payload: payload.into() });
    }

    /// Build the initial instruction entry from the memory summary, the
    /// recent turn history, and the user's task.
    pub fn push_task(&mut self, task: &str, history: &str, memory: &str) {
        let payload = format!(
            "Context from memory:\n{memory}\n\nChat history:\n{history}\n\nUser task:\n{task}"
        );
        self.push(EntryKind::Instruction, payload);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Flatten the log to a single prompt string.
    ///
    /// Called once per provider request; the structured entries remain the
    /// source of truth in between.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            out.push_str(&entry.payload);
        }
        out
    }
}
