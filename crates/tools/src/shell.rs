//! Shell tool — execute system commands with guardrails.
//!
//! Every outcome is text for the model, including refusals and timeouts.
//! Two guards run before anything executes:
//! - destructive commands that touch a protected item are refused with a
//!   "SAFETY ALERT" message
//! - the whole command runs under a wall-clock timeout and a "TIMEOUT ALERT"
//!   message replaces the output when it fires
//!
//! Output is tail-truncated so a chatty command cannot flood the prompt.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use alfred_core::error::ToolError;
use alfred_core::tool::Tool;

/// Command fragments that indicate a deletion, move, or overwrite.
const DESTRUCTIVE_KEYWORDS: &[&str] = &["rm ", "rmdir ", "mv ", ">", "truncate"];

/// Keep at most this many characters of combined output (tail).
const MAX_OUTPUT_CHARS: usize = 4000;

/// Execute shell commands, refusing destructive ones aimed at protected paths.
pub struct ShellTool {
    timeout_secs: u64,
    protected_items: Vec<String>,
}

impl ShellTool {
    pub fn new(timeout_secs: u64, protected_items: Vec<String>) -> Self {
        Self { timeout_secs, protected_items }
    }

    /// If the command both looks destructive and mentions a protected item,
    /// return the item that triggered the refusal.
    fn protected_target(&self, command: &str) -> Option<&str> {
        let is_destructive = DESTRUCTIVE_KEYWORDS.iter().any(|k| command.contains(k));
        if !is_destructive {
            return None;
        }
        self.protected_items
            .iter()
            .find(|item| command.contains(item.as_str()))
            .map(String::as_str)
    }

    /// Keep the last `MAX_OUTPUT_CHARS` characters of output. Recent output
    /// matters most when diagnosing a failure.
    fn truncate_tail(output: String) -> String {
        let count = output.chars().count();
        if count <= MAX_OUTPUT_CHARS {
            return output;
        }
        let tail: String = output.chars().skip(count - MAX_OUTPUT_CHARS).collect();
        format!("{tail}\n...(older output truncated)")
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell_exec"
    }

    fn description(&self) -> &str {
        "Execute a Linux shell command and return its output. Use this for running programs, inspecting the system, installing packages, and file operations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        if let Some(item) = self.protected_target(command) {
            warn!(command = %command, item = %item, "Blocked destructive command");
            return Ok(format!(
                "SAFETY ALERT: Access denied. The command targets the protected item '{item}'. \
                 Only non-essential files (logs, scratch output) may be deleted or moved."
            ));
        }

        info!(command = %command, "Executing shell command");

        let run = Command::new("sh").args(["-c", command]).output();

        let output = match tokio::time::timeout(Duration::from_secs(self.timeout_secs), run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "shell_exec".into(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!(command = %command, timeout_secs = self.timeout_secs, "Command timed out");
                return Ok(format!(
                    "TIMEOUT ALERT: Command took longer than {} seconds and was terminated.",
                    self.timeout_secs
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        debug!(exit = ?output.status.code(), stdout_len = stdout.len(), stderr_len = stderr.len(), "Command finished");

        let mut text = format!("STDOUT:\n{stdout}\n");
        if !stderr.is_empty() {
            text.push_str(&format!("\nSTDERR (Warnings/Errors):\n{stderr}"));
        }

        let text = Self::truncate_tail(text);
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "STDOUT:" {
            return Ok("Command executed successfully.".into());
        }
        Ok(text.trim().to_string())
    }
}
