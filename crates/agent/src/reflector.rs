//! Self-correction reflector.
//!
//! When a shell command fails, the loop makes one deliberate secondary pass
//! through a stronger model to propose a replacement command. The reflector
//! never propagates provider failures: any internal error means "no fix" and
//! the loop continues with the original failure text.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use alfred_core::provider::{CompletionBackend, CompletionRequest};

/// Proposes a corrected command for a failed shell execution, or nothing.
#[async_trait]
pub trait CommandReflector: Send + Sync {
    async fn reflect(&self, task: &str, failed_command: &str, error_log: &str) -> Option<String>;
}

/// A reflector that asks a completion backend for the fix.
///
/// Runs at low temperature with no tool declarations: the output contract is
/// a single raw command string.
pub struct ProviderReflector {
    backend: Arc<dyn CompletionBackend>,
}

impl ProviderReflector {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    fn build_prompt(task: &str, failed_command: &str, error_log: &str) -> String {
        format!(
            "TASK: An AI agent tried to execute a command but FAILED.\n\
             \n\
             --- CONTEXT ---\n\
             USER INTENT: \"{task}\"\n\
             FAILED COMMAND: `{failed_command}`\n\
             ERROR LOGS:\n\
             {error_log}\n\
             \n\
             --- YOUR GOAL ---\n\
             1. Analyze WHY it failed (permissions? typo? interaction required? missing tool?).\n\
             2. Provide ONLY the corrected Linux command (or command sequence) to fix it.\n\
             3. If it was a timeout waiting for input, use `yes | command` or appropriate flags (like `-y`).\n\
             4. If the error is unfixable via command, explain shortly why.\n\
             \n\
             --- OUTPUT FORMAT ---\n\
             Return ONLY the raw command string. No markdown, no explanation.\n\
             Example: `pip install --upgrade pip`"
        )
    }

    /// Strip markdown artifacts from the model's proposal.
    fn clean_proposal(raw: &str) -> Option<String> {
        let cleaned = raw.replace('`', "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || cleaned == alfred_core::provider::EMPTY_RESPONSE_SENTINEL {
            return None;
        }
        Some(cleaned.to_string())
    }
}

#[async_trait]
impl CommandReflector for ProviderReflector {
    async fn reflect(&self, task: &str, failed_command: &str, error_log: &str) -> Option<String> {
        info!(command = %failed_command, "Reflector activated");

        let request = CompletionRequest {
            system_instruction: "You are an expert Linux sysadmin and debugger.".into(),
            tools: vec![],
            prompt: Self::build_prompt(task, failed_command, error_log),
            temperature: 0.2,
        };

        match self.backend.complete(request).await {
            Ok(response) => {
                let fix = Self::clean_proposal(&response.text());
                if let Some(command) = &fix {
                    info!(command = %command, "Reflector proposed fix");
                }
                fix
            }
            Err(e) => {
                warn!(error = %e, "Reflector pass failed; keeping original failure");
                None
            }
        }
    }
}
