//! Tool trait and capability registry.
//!
//! Tools are what give the agent the ability to act in the world: execute
//! shell commands, read/write files, search the web, etc. The registry maps
//! names to implementations, scopes declarations by role, and converts every
//! tool failure into text — nothing raises across the execution boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Role tag that makes a tool visible to every role.
pub const ROLE_ALL: &str = "all";

/// Static identifier→role table for tools that don't declare a role
/// themselves. Matched by name prefix; first hit wins.
///
/// This replaces inferring ownership from module paths: the mapping is
/// explicit, and set once at registration time.
const DEFAULT_ROLE_TABLE: &[(&str, &str)] = &[("delegate_", "ceo")];

fn table_role_for(name: &str) -> &'static str {
    DEFAULT_ROLE_TABLE
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, role)| *role)
        .unwrap_or(ROLE_ALL)
}

/// A request to execute a tool, produced from a completion response part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self { name: name.into(), arguments }
    }
}

/// The core Tool trait.
///
/// Each tool (shell_exec, file_read, search_web, etc.) implements this trait
/// and is registered in the ToolRegistry. Implementations convert their own
/// internal failures into `Err(ToolError)`; the registry turns those into
/// text for the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell_exec", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters, including `required`.
    fn parameters_schema(&self) -> serde_json::Value;

    /// The role that owns this tool. `None` defers to the registration-time
    /// identifier→role table (which defaults to "all").
    fn role(&self) -> Option<&str> {
        None
    }

    /// Execute the tool with the given arguments, returning a text outcome.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a declaration for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

struct Registered {
    tool: Arc<dyn Tool>,
    role: String,
}

/// A registry of available tools.
///
/// The reasoning loop uses this to:
/// 1. Get role-scoped tool declarations to send to the model
/// 2. Look up and execute tools when the model requests them
///
/// The map is RwLock-guarded so additional tools (e.g. self-authored skills)
/// can be registered at runtime while other tasks are executing. The guard is
/// never held across an await point: execution clones the `Arc` out first.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Registered>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: RwLock::new(HashMap::new()) }
    }

    /// Register a tool, resolving its owning role now.
    ///
    /// Duplicate names: the last registration wins. Runtime registration of
    /// additional tools goes through this same call.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let role = tool
            .role()
            .map(str::to_string)
            .unwrap_or_else(|| table_role_for(&name).to_string());

        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        if tools.insert(name.clone(), Registered { tool, role }).is_some() {
            warn!(tool = %name, "Replacing previously registered tool (last registration wins)");
        }
    }

    /// The resolved role tag for a registered tool.
    pub fn role_of(&self, name: &str) -> Option<String> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools.get(name).map(|r| r.role.clone())
    }

    /// Tool declarations visible to the given role: every "all"-tagged tool
    /// plus the tools tagged to exactly this role.
    pub fn definitions_for_role(&self, role: &str) -> Vec<ToolDefinition> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        let mut defs: Vec<ToolDefinition> = tools
            .values()
            .filter(|r| r.role == ROLE_ALL || r.role == role)
            .map(|r| r.tool.to_definition())
            .collect();
        // Deterministic order for prompts and tests
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by name, returning a text outcome.
    ///
    /// Unknown names and tool failures come back as formatted text — this
    /// boundary never raises, so a hallucinated tool name stays a recoverable
    /// observation for the next reasoning pass.
    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> String {
        let tool = {
            let tools = self.tools.read().expect("tool registry lock poisoned");
            tools.get(name).map(|r| Arc::clone(&r.tool))
        };

        let Some(tool) = tool else {
            return format!("Error: tool '{name}' not found in the registry.");
        };

        match tool.execute(arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                format!("Tool execution error ({name}): {e}")
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().expect("tool registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
