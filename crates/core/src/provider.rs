//! CompletionBackend trait — the abstraction over LLM completion providers.
//!
//! A backend accepts a fully-rendered prompt plus the role-scoped tool
//! declarations and returns an ordered list of response parts: free text
//! and/or tool calls. The rotating client, the Gemini HTTP backend, and the
//! test mocks all implement this trait — the reasoning loop never knows
//! which one it is talking to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::tool::ToolInvocation;

/// Returned when a response carries neither text nor a tool call.
pub const EMPTY_RESPONSE_SENTINEL: &str = "...";

/// A single completion request.
///
/// One of these is outstanding per loop iteration, never more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The persona / protocol text for the active role.
    pub system_instruction: String,

    /// Tool declarations visible to this role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// The task context, rendered to a flat prompt.
    pub prompt: String,

    /// Sampling temperature (0.0 = deterministic).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool declaration sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (unique within a registry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters, including the
    /// `required` subset
    pub parameters: serde_json::Value,
}

/// One part of a completion response, in provider part order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePart {
    Text(String),
    ToolCall(ToolInvocation),
}

/// A complete response from a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub parts: Vec<ResponsePart>,
}

impl CompletionResponse {
    /// A response consisting of a single text part.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { parts: vec![ResponsePart::Text(text.into())] }
    }

    /// A response consisting of a single tool call.
    pub fn tool_call(call: ToolInvocation) -> Self {
        Self { parts: vec![ResponsePart::ToolCall(call)] }
    }

    /// The first tool call in part order, if any.
    ///
    /// When a response carries multiple tool-call parts, only this one is
    /// honored per reasoning pass.
    pub fn first_tool_call(&self) -> Option<&ToolInvocation> {
        self.parts.iter().find_map(|p| match p {
            ResponsePart::ToolCall(call) => Some(call),
            ResponsePart::Text(_) => None,
        })
    }

    /// All text parts joined with newlines; the sentinel `"..."` when the
    /// response carries no usable text.
    pub fn text(&self) -> String {
        let joined = self
            .parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::Text(t) if !t.trim().is_empty() => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if joined.is_empty() {
            EMPTY_RESPONSE_SENTINEL.to_string()
        } else {
            joined
        }
    }
}

/// The core completion trait.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "gemini", "rotating").
    fn name(&self) -> &str;

    /// Send a request and get a complete response, or a failure value.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
