//! File read tool.

use async_trait::async_trait;
use tracing::debug;

use alfred_core::error::ToolError;
use alfred_core::tool::Tool;

/// Read a file and hand its contents back as text.
///
/// Missing files come back as text rather than an error so the model can
/// recover (list the directory, try another path) instead of aborting.
pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file at the given path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        debug!(path = %path, "Reading file");

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(format!("Contents of {path}:\n\n{content}")),
            Err(e) => Ok(format!("Error: could not read file '{path}': {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "remember the milk").unwrap();

        let out = FileReadTool
            .execute(serde_json::json!({"path": path.to_str().unwrap()}))
            .await
            .unwrap();
        assert!(out.contains("remember the milk"));
        assert!(out.starts_with("Contents of"));
    }

    #[tokio::test]
    async fn missing_file_is_recoverable_text() {
        let out = FileReadTool
            .execute(serde_json::json!({"path": "/tmp/alfred_no_such_file_9x7.txt"}))
            .await
            .unwrap();
        assert!(out.starts_with("Error: could not read file"));
    }

    #[tokio::test]
    async fn missing_path_argument() {
        let result = FileReadTool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
