//! File write tool.

use async_trait::async_trait;
use tracing::{debug, warn};

use alfred_core::error::ToolError;
use alfred_core::tool::Tool;

/// Write text to a file, creating parent directories as needed.
///
/// Writes into protected items are refused with text the model can react to.
pub struct FileWriteTool {
    protected_items: Vec<String>,
}

impl FileWriteTool {
    pub fn new(protected_items: Vec<String>) -> Self {
        Self { protected_items }
    }

    fn protected_target(&self, path: &str) -> Option<&str> {
        self.protected_items
            .iter()
            .find(|item| path.contains(item.as_str()))
            .map(String::as_str)
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a text file with the given content. Parent directories are created automatically."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write"
                },
                "content": {
                    "type": "string",
                    "description": "The full text content to write into the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        if let Some(item) = self.protected_target(path) {
            warn!(path = %path, item = %item, "Blocked write to protected item");
            return Ok(format!(
                "SAFETY ALERT: Write access denied for '{path}' — it touches the protected item '{item}'."
            ));
        }

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return Ok(format!("Error: could not create directory for '{path}': {e}"));
                }
            }
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => {
                debug!(path = %path, bytes = content.len(), "Wrote file");
                Ok(format!("Successfully wrote {} bytes to '{path}'.", content.len()))
            }
            Err(e) => Ok(format!("Error: could not write file '{path}': {e}")),
        }
    }
}
