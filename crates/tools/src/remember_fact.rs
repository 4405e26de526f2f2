//! Long-term fact storage tool.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use alfred_core::error::ToolError;
use alfred_core::memory::MemoryProvider;
use alfred_core::tool::Tool;

/// Store a permanent fact about the user in long-term memory.
///
/// Holds the session's memory provider; the saved facts come back to the
/// model through the fact summary on every subsequent task.
pub struct RememberFactTool {
    memory: Arc<dyn MemoryProvider>,
}

impl RememberFactTool {
    pub fn new(memory: Arc<dyn MemoryProvider>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl Tool for RememberFactTool {
    fn name(&self) -> &str {
        "remember_fact"
    }

    fn description(&self) -> &str {
        "Store a permanent fact about the user (e.g. name, location, preferences). Use this when the user introduces themselves or states something worth remembering."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "fact_type": {
                    "type": "string",
                    "description": "The category (e.g. 'Name', 'Job', 'Location')"
                },
                "fact_value": {
                    "type": "string",
                    "description": "The actual fact (e.g. 'Sam', 'Berlin')"
                }
            },
            "required": ["fact_type", "fact_value"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let key = arguments["fact_type"].as_str().unwrap_or("").trim();
        let value = arguments["fact_value"].as_str().unwrap_or("").trim();

        if key.is_empty() || value.is_empty() {
            return Ok("Error: both 'fact_type' and 'fact_value' are required.".into());
        }

        match self.memory.remember_fact(key, value).await {
            Ok(()) => {
                debug!(key = %key, "Stored long-term fact");
                Ok(format!("Saved to long-term memory: {key} = {value}"))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to store fact");
                Ok(format!("Error saving fact to memory: {e}"))
            }
        }
    }
}
