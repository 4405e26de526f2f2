//! The bounded think/act/observe reasoning loop.
//!
//! One `run` call drives one task: render the task context, ask the
//! completion backend, execute at most one tool call per pass, observe the
//! result, repeat. Failed shell commands get one reflector correction.
//! Everything the caller sees is plain text — success, degraded-error text,
//! or the fixed abort text. Nothing raises across the task boundary.

use std::sync::Arc;
use tracing::{debug, info, warn};

use alfred_core::context::{EntryKind, TaskContext};
use alfred_core::persona::InstructionSource;
use alfred_core::provider::{CompletionBackend, CompletionRequest};
use alfred_core::status::{NullSink, StatusSink};
use alfred_core::tool::{ToolRegistry, ROLE_ALL};

use crate::classifier::classify_shell_output;
use crate::persona::PersonaBook;
use crate::reflector::CommandReflector;
use crate::status::status_message;

/// Name of the shell tool, the only one eligible for self-correction.
pub const SHELL_TOOL: &str = "shell_exec";

/// Returned when the iteration ceiling is hit.
pub const ABORT_TEXT: &str =
    "I had to stop: this task took too many steps. Try breaking it into smaller parts.";

/// Marker appended to a tool result that was re-run with a reflector fix.
const AUTO_FIX_NOTE: &str = "(SYSTEM NOTE: Auto-fixed via reflector.)";

const EMPTY_RESULT_MARKER: &str = "Command executed successfully.";

/// The reasoning loop for one agent role.
///
/// Cheap to construct per task; the heavyweight collaborators (backend,
/// registry, reflector) are shared by handle.
pub struct AgentLoop {
    backend: Arc<dyn CompletionBackend>,
    registry: Arc<ToolRegistry>,
    reflector: Arc<dyn CommandReflector>,
    personas: Arc<dyn InstructionSource>,
    status: Arc<dyn StatusSink>,
    role: String,
    temperature: f32,
    max_iterations: u32,
}

impl AgentLoop {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        registry: Arc<ToolRegistry>,
        reflector: Arc<dyn CommandReflector>,
    ) -> Self {
        Self {
            backend,
            registry,
            reflector,
            personas: Arc::new(PersonaBook),
            status: Arc::new(NullSink),
            role: ROLE_ALL.to_string(),
            temperature: 0.7,
            max_iterations: 15,
        }
    }

    /// Scope the loop to a role (tool visibility and persona).
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the iteration ceiling, counted at each thinking pass.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = sink;
        self
    }

    pub fn with_personas(mut self, personas: Arc<dyn InstructionSource>) -> Self {
        self.personas = personas;
        self
    }

    /// Drive one task to completion and return the answer text.
    ///
    /// `history` is the rendered recent conversation, `memory` the long-term
    /// fact summary; both are injected verbatim into the initial context.
    pub async fn run(&self, task: &str, history: &str, memory: &str) -> String {
        info!(role = %self.role, task = %task, "Starting task");

        let system_instruction = self.personas.instruction(&self.role);
        let tools = self.registry.definitions_for_role(&self.role);

        let mut context = TaskContext::new();
        context.push_task(task, history, memory);

        let mut iteration: u32 = 0;
        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                warn!(ceiling = self.max_iterations, "Iteration ceiling hit, aborting task");
                return ABORT_TEXT.to_string();
            }
            debug!(iteration, "Thinking pass");

            let request = CompletionRequest {
                system_instruction: system_instruction.clone(),
                tools: tools.clone(),
                prompt: context.render(),
                temperature: self.temperature,
            };

            let response = match self.backend.complete(request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(iteration, error = %e, "Provider failure, ending task");
                    if iteration == 1 {
                        return format!("System Error: {e}");
                    }
                    return format!(
                        "I made progress on this task but the completion provider failed \
                         before I could finish: {e}"
                    );
                }
            };

            // Only the first tool-call part is honored per thinking pass.
            let Some(call) = response.first_tool_call() else {
                return response.text();
            };
            let call = call.clone();
            info!(tool = %call.name, args = %call.arguments, "Tool requested");

            // Best-effort progress line; the sink swallows its own failures.
            self.status.notify(&status_message(&call)).await;

            let mut result = self.registry.execute(&call.name, call.arguments.clone()).await;
            if result.trim().is_empty() {
                result = EMPTY_RESULT_MARKER.to_string();
            }

            if call.name == SHELL_TOOL && classify_shell_output(&result).is_failure() {
                result = self.correct_once(task, &call.arguments, result).await;
            }

            context.push(EntryKind::ToolResult, format!(
                "SYSTEM REPORT:\n- Tool used: '{}'\n- Tool output:\n{}",
                call.name, result
            ));
            context.push(EntryKind::Note,
                "If the task is fulfilled by the output above, answer the user directly now. \
                 Otherwise continue with the next step. Base your answer ONLY on observed tool output."
                    .to_string(),
            );
        }
    }

    /// One reflector pass over a failed shell result.
    ///
    /// Re-invokes the shell tool at most once with the proposed command; the
    /// corrected result carries an auto-fix marker. With no proposal the
    /// original failure text is kept.
    async fn correct_once(
        &self,
        task: &str,
        failed_args: &serde_json::Value,
        failure: String,
    ) -> String {
        let failed_command = failed_args["command"].as_str().unwrap_or_default();
        warn!(command = %failed_command, "Shell failure detected, trying one correction");

        let Some(fix) = self.reflector.reflect(task, failed_command, &failure).await else {
            return failure;
        };

        info!(command = %fix, "Retrying with corrected command");
        let mut retry = self
            .registry
            .execute(SHELL_TOOL, serde_json::json!({ "command": fix }))
            .await;
        if retry.trim().is_empty() {
            retry = EMPTY_RESULT_MARKER.to_string();
        }
        format!("{retry}\n\n{AUTO_FIX_NOTE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use alfred_core::error::{ProviderError, ToolError};
    use alfred_core::provider::{CompletionResponse, ResponsePart};
    use alfred_core::tool::{Tool, ToolInvocation};

    /// Plays back a scripted sequence of completion results.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CompletionResponse::text_only("script exhausted")))
        }
    }

    fn text(s: &str) -> Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse::text_only(s))
    }

    fn tool_call(name: &str, args: serde_json::Value) -> Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse { parts: vec![ResponsePart::ToolCall(ToolInvocation::new(name, args))] })
    }

    /// A fake shell tool scripted per command string.
    struct FakeShell {
        outputs: Mutex<std::collections::HashMap<String, String>>,
        executions: Mutex<Vec<String>>,
    }

    impl FakeShell {
        fn new(outputs: &[(&str, &str)]) -> Self {
            Self {
                outputs: Mutex::new(
                    outputs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ),
                executions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Tool for FakeShell {
        fn name(&self) -> &str {
            SHELL_TOOL
        }
        fn description(&self) -> &str {
            "fake shell"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type":"object","properties":{"command":{"type":"string"}},"required":["command"]})
        }
        async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
            let command = args["command"].as_str().unwrap_or_default().to_string();
            self.executions.lock().unwrap().push(command.clone());
            let outputs = self.outputs.lock().unwrap();
            Ok(outputs.get(&command).cloned().unwrap_or_else(|| "STDOUT:\nok".into()))
        }
    }

    struct SearchStub;

    #[async_trait]
    impl Tool for SearchStub {
        fn name(&self) -> &str {
            "search_web"
        }
        fn description(&self) -> &str {
            "stub search"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type":"object","properties":{"query":{"type":"string"}},"required":["query"]})
        }
        async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
            Ok(r#"{"answer":"32°C and sunny","results":[]}"#.into())
        }
    }

    struct FixedReflector(Option<&'static str>);

    #[async_trait]
    impl CommandReflector for FixedReflector {
        async fn reflect(&self, _t: &str, _c: &str, _e: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct PanickyReflector;

    #[async_trait]
    impl CommandReflector for PanickyReflector {
        async fn reflect(&self, _t: &str, _c: &str, _e: &str) -> Option<String> {
            panic!("reflector must not be consulted");
        }
    }

    fn agent(
        backend: Arc<ScriptedBackend>,
        registry: Arc<ToolRegistry>,
        reflector: Arc<dyn CommandReflector>,
    ) -> AgentLoop {
        AgentLoop::new(backend, registry, reflector)
    }

    #[tokio::test]
    async fn text_response_ends_loop_in_one_iteration() {
        let backend = Arc::new(ScriptedBackend::new(vec![text("The answer is 42.")]));
        let registry = Arc::new(ToolRegistry::new());
        let out = agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .run("what is the answer?", "", "")
            .await;

        assert_eq!(out, "The answer is 42.");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn empty_response_returns_sentinel() {
        let backend =
            Arc::new(ScriptedBackend::new(vec![Ok(CompletionResponse { parts: vec![] })]));
        let registry = Arc::new(ToolRegistry::new());
        let out = agent(backend, registry, Arc::new(PanickyReflector)).run("hi", "", "").await;
        assert_eq!(out, "...");
    }

    #[tokio::test]
    async fn unregistered_tool_is_a_recoverable_observation() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call("imaginary_tool", serde_json::json!({})),
            text("I could not use that tool."),
        ]));
        let registry = Arc::new(ToolRegistry::new());
        let loop_ = agent(backend.clone(), registry, Arc::new(PanickyReflector));

        let out = loop_.run("do something", "", "").await;
        assert_eq!(out, "I could not use that tool.");
        assert_eq!(backend.calls(), 2);

        // The not-found text was fed back to the model by name.
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].contains("imaginary_tool"));
        assert!(prompts[1].contains("not found"));
    }

    #[tokio::test]
    async fn provider_failure_on_first_iteration_surfaces_error() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(
            ProviderError::CredentialsExhausted("all 3 credentials failed".into()),
        )]));
        let registry = Arc::new(ToolRegistry::new());
        let out = agent(backend, registry, Arc::new(PanickyReflector)).run("hi", "", "").await;
        assert!(out.starts_with("System Error:"));
        assert!(out.contains("all 3 credentials failed"));
    }

    #[tokio::test]
    async fn provider_failure_mid_task_degrades_without_spinning() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call(SHELL_TOOL, serde_json::json!({"command": "uptime"})),
            Err(ProviderError::Network("connection reset".into())),
        ]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(FakeShell::new(&[])));

        let out = agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .run("check uptime", "", "")
            .await;
        assert!(out.contains("completion provider failed"));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn search_scenario_two_provider_calls_one_execution() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call("search_web", serde_json::json!({"query": "weather today"})),
            text("It is 32°C and sunny today."),
        ]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(SearchStub));

        let out = agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .run("search weather today", "", "")
            .await;

        assert_eq!(out, "It is 32°C and sunny today.");
        assert_eq!(backend.calls(), 2);

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].contains("32°C"), "tool output must reach the second pass");
    }

    #[tokio::test]
    async fn shell_failure_triggers_exactly_one_correction() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call(SHELL_TOOL, serde_json::json!({"command": "apt install foo"})),
            text("Installed foo after correcting the command."),
        ]));
        let shell = Arc::new(FakeShell::new(&[
            ("apt install foo", "sh: 1: apt: command not found"),
            ("apt-get install -y foo", "STDOUT:\nSetting up foo (1.0) ..."),
        ]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(shell.clone());

        let reflector = Arc::new(FixedReflector(Some("apt-get install -y foo")));
        let out = agent(backend.clone(), registry, reflector).run("install foo", "", "").await;

        assert_eq!(out, "Installed foo after correcting the command.");
        let executions = shell.executions.lock().unwrap().clone();
        assert_eq!(executions, vec!["apt install foo", "apt-get install -y foo"]);

        // The corrected result, with its auto-fix marker, reached the model.
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].contains("Setting up foo"));
        assert!(prompts[1].contains("Auto-fixed via reflector"));
    }

    #[tokio::test]
    async fn failed_correction_is_not_retried_again() {
        // The corrected command also fails; the loop must not reflect twice.
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call(SHELL_TOOL, serde_json::json!({"command": "apt install foo"})),
            text("Could not install foo."),
        ]));
        let shell = Arc::new(FakeShell::new(&[
            ("apt install foo", "sh: 1: apt: command not found"),
            ("apt-get install foo", "E: Error: unable to locate package foo"),
        ]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(shell.clone());

        let reflector = Arc::new(FixedReflector(Some("apt-get install foo")));
        let out = agent(backend, registry, reflector).run("install foo", "", "").await;

        assert_eq!(out, "Could not install foo.");
        assert_eq!(shell.executions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn no_fix_keeps_original_failure_visible() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call(SHELL_TOOL, serde_json::json!({"command": "frobnicate"})),
            text("That command does not exist."),
        ]));
        let shell = Arc::new(FakeShell::new(&[("frobnicate", "sh: 1: frobnicate: command not found")]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(shell.clone());

        let out = agent(backend.clone(), registry, Arc::new(FixedReflector(None)))
            .run("frobnicate the thing", "", "")
            .await;

        assert_eq!(out, "That command does not exist.");
        assert_eq!(shell.executions.lock().unwrap().len(), 1);
        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[1].contains("command not found"));
        assert!(!prompts[1].contains("Auto-fixed"));
    }

    #[tokio::test]
    async fn non_shell_failures_skip_the_reflector() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_call("search_web", serde_json::json!({"query": "x"})),
            text("done"),
        ]));

        struct ErroringSearch;
        #[async_trait]
        impl Tool for ErroringSearch {
            fn name(&self) -> &str {
                "search_web"
            }
            fn description(&self) -> &str {
                "always errors"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type":"object","properties":{}})
            }
            async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
                Ok("Search error: API returned status 500".into())
            }
        }

        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(ErroringSearch));

        // PanickyReflector proves the reflector is never consulted.
        let out = agent(backend, registry, Arc::new(PanickyReflector)).run("x", "", "").await;
        assert_eq!(out, "done");
    }

    #[tokio::test]
    async fn iteration_ceiling_yields_fixed_abort_text() {
        // Every pass requests another tool call; the loop must cut off.
        let script: Vec<_> = (0..20)
            .map(|_| tool_call(SHELL_TOOL, serde_json::json!({"command": "uptime"})))
            .collect();
        let backend = Arc::new(ScriptedBackend::new(script));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(FakeShell::new(&[])));

        let out = agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .run("loop forever", "", "")
            .await;

        assert_eq!(out, ABORT_TEXT);
        // 15 thinking passes happened; the 16th entry aborted before calling.
        assert_eq!(backend.calls(), 15);
    }

    #[tokio::test]
    async fn ceiling_is_configurable() {
        let script: Vec<_> = (0..5)
            .map(|_| tool_call(SHELL_TOOL, serde_json::json!({"command": "uptime"})))
            .collect();
        let backend = Arc::new(ScriptedBackend::new(script));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(FakeShell::new(&[])));

        let out = agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .with_max_iterations(2)
            .run("loop forever", "", "")
            .await;

        assert_eq!(out, ABORT_TEXT);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn first_tool_call_part_wins() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(CompletionResponse {
                parts: vec![
                    ResponsePart::Text("let me check".into()),
                    ResponsePart::ToolCall(ToolInvocation::new(
                        SHELL_TOOL,
                        serde_json::json!({"command": "uptime"}),
                    )),
                    ResponsePart::ToolCall(ToolInvocation::new(
                        "search_web",
                        serde_json::json!({"query": "x"}),
                    )),
                ],
            }),
            text("up 3 days"),
        ]));
        let shell = Arc::new(FakeShell::new(&[]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(shell.clone());
        registry.register(Arc::new(SearchStub));

        let out = agent(backend, registry, Arc::new(PanickyReflector)).run("uptime?", "", "").await;
        assert_eq!(out, "up 3 days");
        assert_eq!(shell.executions.lock().unwrap().clone(), vec!["uptime"]);
    }

    #[tokio::test]
    async fn history_and_memory_reach_the_first_prompt() {
        let backend = Arc::new(ScriptedBackend::new(vec![text("hello again")]));
        let registry = Arc::new(ToolRegistry::new());

        agent(backend.clone(), registry, Arc::new(PanickyReflector))
            .run("greet me", "User: hi\nAgent: hello", "- name: Sam")
            .await;

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("User: hi"));
        assert!(prompts[0].contains("- name: Sam"));
        assert!(prompts[0].contains("User task:\ngreet me"));
    }
}
