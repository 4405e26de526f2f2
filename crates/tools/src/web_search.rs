//! Web search tool backed by the Tavily API.
//!
//! A missing API key is a configuration gap the model should hear about as
//! text, not a crash: the tool stays registered and returns an explanatory
//! error string.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use alfred_core::error::ToolError;
use alfred_core::tool::Tool;

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Keep at most this many characters of the raw search response.
const MAX_RESULT_CHARS: usize = 8000;

pub struct WebSearchTool {
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("Search API key missing; search_web will return an error message");
        }
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API endpoint (for tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_answer: bool,
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the internet for real-time information, news, or coding solutions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query or question."
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok("Error: search API key is missing. Cannot search the web.".into());
        };

        info!(query = %query, "Searching the web");

        let body = SearchRequest {
            api_key,
            query,
            search_depth: "advanced",
            max_results: 5,
            include_answer: true,
        };

        let response = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return Ok(format!("Search error: {e}")),
        };

        if !response.status().is_success() {
            let status = response.status();
            return Ok(format!("Search error: API returned status {status}"));
        }

        match response.text().await {
            Ok(text) => Ok(text.chars().take(MAX_RESULT_CHARS).collect()),
            Err(e) => Ok(format!("Search error: {e}")),
        }
    }
}
