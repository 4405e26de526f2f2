//! Progress message templates for tool executions.
//!
//! Keyed by the well-known tool names; everything else gets a generic line.
//! The loop sends these through the status sink right before acting.

use alfred_core::tool::ToolInvocation;

/// A short human-readable line describing what the agent is about to do.
pub fn status_message(invocation: &ToolInvocation) -> String {
    let args = &invocation.arguments;
    match invocation.name.as_str() {
        "shell_exec" => match args["command"].as_str() {
            Some(command) => format!("Running command: {command}"),
            None => "Running a shell command...".into(),
        },
        "search_web" => match args["query"].as_str() {
            Some(query) => format!("Searching the web for \"{query}\"..."),
            None => "Searching the web...".into(),
        },
        "read_file" => match args["path"].as_str() {
            Some(path) => format!("Reading {path}..."),
            None => "Reading a file...".into(),
        },
        "write_file" => match args["path"].as_str() {
            Some(path) => format!("Writing {path}..."),
            None => "Writing a file...".into(),
        },
        "remember_fact" => "Saving that to long-term memory...".into(),
        "delegate_task" => match args["agent_role"].as_str() {
            Some(role) => format!("Delegating to the {role} sub-agent..."),
            None => "Delegating a sub-task...".into(),
        },
        other => format!("Using tool '{other}'..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tools_get_specific_messages() {
        let msg = status_message(&ToolInvocation::new(
            "shell_exec",
            serde_json::json!({"command": "df -h"}),
        ));
        assert_eq!(msg, "Running command: df -h");

        let msg = status_message(&ToolInvocation::new(
            "search_web",
            serde_json::json!({"query": "weather today"}),
        ));
        assert_eq!(msg, "Searching the web for \"weather today\"...");

        let msg = status_message(&ToolInvocation::new(
            "delegate_task",
            serde_json::json!({"agent_role": "researcher", "task_prompt": "x"}),
        ));
        assert_eq!(msg, "Delegating to the researcher sub-agent...");
    }

    #[test]
    fn unknown_tool_gets_generic_message() {
        let msg = status_message(&ToolInvocation::new("calendar_add", serde_json::json!({})));
        assert_eq!(msg, "Using tool 'calendar_add'...");
    }

    #[test]
    fn malformed_arguments_fall_back() {
        let msg = status_message(&ToolInvocation::new("shell_exec", serde_json::json!({})));
        assert_eq!(msg, "Running a shell command...");
    }
}
