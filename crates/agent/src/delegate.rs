//! Task delegation tool for the coordinator role.
//!
//! `delegate_task` spawns a nested reasoning loop under a specialist role
//! with a mission-specific instruction and returns its answer as the tool
//! result. Sub-agents cannot see this tool (it is scoped to `ceo`), so a
//! delegate can never delegate again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use alfred_core::error::ToolError;
use alfred_core::persona::{InstructionSource, StaticInstruction};
use alfred_core::provider::CompletionBackend;
use alfred_core::tool::{Tool, ToolRegistry};

use crate::loop_runner::AgentLoop;
use crate::persona::PersonaBook;
use crate::reflector::CommandReflector;

/// Roles a mission may be delegated to. The coordinator itself is excluded.
const SUB_ROLES: &[&str] = &["web_surfer", "sysadmin", "researcher"];

/// Runs one sub-task under a specialist role via a nested loop.
///
/// Shares the session's backend, registry, and reflector by handle; each
/// delegation builds a fresh loop with the specialist persona plus the
/// assigned mission. The sub-agent starts with no history or fact summary.
pub struct DelegateTool {
    backend: Arc<dyn CompletionBackend>,
    registry: Arc<ToolRegistry>,
    reflector: Arc<dyn CommandReflector>,
    temperature: f32,
    max_iterations: u32,
}

impl DelegateTool {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<ToolRegistry>,
        reflector: Arc<dyn CommandReflector>,
    ) -> Self {
        Self { backend, registry, reflector, temperature: 0.7, max_iterations: 15 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Iteration ceiling for each nested loop.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    fn mission_instruction(role: &str, mission: &str) -> String {
        let base = PersonaBook.instruction(role);
        format!(
            "{base}\n\nYOUR ASSIGNED MISSION:\n{mission}\n\nComplete this mission with your \
             tools and report the final result back to the coordinator."
        )
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn name(&self) -> &str {
        "delegate_task"
    }

    fn description(&self) -> &str {
        "Delegate a sub-task to a specialized sub-agent ('web_surfer' for online sources, 'sysadmin' for terminal and files, 'researcher' for web research). Use this to assign workload instead of doing specialist work yourself."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "agent_role": {
                    "type": "string",
                    "enum": SUB_ROLES,
                    "description": "Which specialist handles the sub-task"
                },
                "task_prompt": {
                    "type": "string",
                    "description": "Clear, detailed instructions for the sub-agent"
                }
            },
            "required": ["agent_role", "task_prompt"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let role = arguments["agent_role"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'agent_role' argument".into()))?;
        let mission = arguments["task_prompt"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'task_prompt' argument".into()))?;

        if !SUB_ROLES.contains(&role) {
            return Ok(format!(
                "Error: unknown delegate role '{role}'. Choose one of: web_surfer, sysadmin, researcher."
            ));
        }

        info!(role = %role, "Delegating sub-task");

        let instruction = Self::mission_instruction(role, mission);
        let worker = AgentLoop::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.registry),
            Arc::clone(&self.reflector),
        )
        .with_role(role)
        .with_personas(Arc::new(StaticInstruction(instruction)))
        .with_temperature(self.temperature)
        .with_max_iterations(self.max_iterations);

        let result = worker.run(mission, "", "").await;
        Ok(format!("[{} REPORT]:\n{result}", role.to_uppercase()))
    }
}
