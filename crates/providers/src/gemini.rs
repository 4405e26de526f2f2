//! Gemini backend — reqwest client for the `generateContent` endpoint.
//!
//! One backend instance is bound to one credential; the rotating client
//! constructs a fresh backend per attempt so key rotation stays in one place.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use alfred_core::error::ProviderError;
use alfred_core::provider::{CompletionBackend, CompletionRequest, CompletionResponse, ResponsePart, ToolDefinition};
use alfred_core::tool::ToolInvocation;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini completion backend bound to a single API key.
pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client,
        }
    }

    /// Override the API base URL (for proxies and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![ApiTool {
            function_declarations: tools
                .iter()
                .map(|t| ApiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let body = ApiRequest {
            system_instruction: ApiContent {
                role: None,
                parts: vec![ApiPart::text(&request.system_instruction)],
            },
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart::text(&request.prompt)],
            }],
            tools: Self::to_api_tools(&request.tools),
            generation_config: ApiGenerationConfig { temperature: request.temperature },
        };

        debug!(model = %self.model, tools = request.tools.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RateLimited(body));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            if error_body.to_lowercase().contains("quota") {
                return Err(ProviderError::RateLimited(error_body));
            }
            return Err(ProviderError::ApiError { status_code: status, message: error_body });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        Ok(parse_candidates(api_response))
    }
}

/// Flatten the first candidate's parts into our response model,
/// preserving part order.
fn parse_candidates(api_response: ApiResponse) -> CompletionResponse {
    let mut parts = Vec::new();

    if let Some(candidate) = api_response.candidates.into_iter().next() {
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                parts.push(ResponsePart::Text(text));
            }
            if let Some(call) = part.function_call {
                parts.push(ResponsePart::ToolCall(ToolInvocation::new(call.name, call.args)));
            }
        }
    }

    CompletionResponse { parts }
}

// --- Wire types ---

#[derive(Serialize)]
struct ApiRequest {
    #[serde(rename = "system_instruction")]
    system_instruction: ApiContent,
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(rename = "generationConfig")]
    generation_config: ApiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "functionCall", default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
}

impl ApiPart {
    fn text(s: &str) -> Self {
        Self { text: Some(s.to_string()), function_call: None }
    }
}

#[derive(Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Serialize)]
struct ApiTool {
    #[serde(rename = "function_declarations")]
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ApiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_from_json(raw: &str) -> CompletionResponse {
        let api: ApiResponse = serde_json::from_str(raw).unwrap();
        parse_candidates(api)
    }

    #[test]
    fn parses_text_response() {
        let response = response_from_json(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello there"}]}}]}"#,
        );
        assert_eq!(response.text(), "Hello there");
        assert!(response.first_tool_call().is_none());
    }

    #[test]
    fn parses_function_call_part() {
        let response = response_from_json(
            r#"{"candidates":[{"content":{"parts":[
                {"functionCall":{"name":"search_web","args":{"query":"weather today"}}}
            ]}}]}"#,
        );
        let call = response.first_tool_call().unwrap();
        assert_eq!(call.name, "search_web");
        assert_eq!(call.arguments["query"], "weather today");
    }

    #[test]
    fn preserves_part_order_with_mixed_parts() {
        let response = response_from_json(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"let me check"},
                {"functionCall":{"name":"shell_exec","args":{"command":"df -h"}}},
                {"functionCall":{"name":"search_web","args":{"query":"x"}}}
            ]}}]}"#,
        );
        assert_eq!(response.parts.len(), 3);
        assert_eq!(response.first_tool_call().unwrap().name, "shell_exec");
    }

    #[test]
    fn empty_candidates_yield_sentinel_text() {
        let response = response_from_json(r#"{"candidates":[]}"#);
        assert_eq!(response.text(), "...");
    }

    #[test]
    fn request_body_shape() {
        let body = ApiRequest {
            system_instruction: ApiContent { role: None, parts: vec![ApiPart::text("be helpful")] },
            contents: vec![ApiContent { role: Some("user".into()), parts: vec![ApiPart::text("hi")] }],
            tools: GeminiBackend::to_api_tools(&[ToolDefinition {
                name: "shell_exec".into(),
                description: "run a command".into(),
                parameters: serde_json::json!({"type":"object","properties":{"command":{"type":"string"}},"required":["command"]}),
            }]),
            generation_config: ApiGenerationConfig { temperature: 0.7 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "be helpful");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["tools"][0]["function_declarations"][0]["name"], "shell_exec");
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
    }

    #[test]
    fn no_tools_means_no_tools_field() {
        let body = ApiRequest {
            system_instruction: ApiContent { role: None, parts: vec![ApiPart::text("x")] },
            contents: vec![],
            tools: GeminiBackend::to_api_tools(&[]),
            generation_config: ApiGenerationConfig { temperature: 0.2 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("tools").is_none());
    }
}
