//! Built-in tools for alfred.
//!
//! `default_registry` is the startup-time registration table: every stateless
//! built-in tool is listed here explicitly, configured from `AppConfig`.
//! Session-bound tools (`remember_fact` with its memory provider, the agent
//! crate's `delegate_task`) are registered by the host once their
//! collaborators exist.

pub mod file_read;
pub mod file_write;
pub mod remember_fact;
pub mod shell;
pub mod web_search;

pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use remember_fact::RememberFactTool;
pub use shell::ShellTool;
pub use web_search::WebSearchTool;

use std::sync::Arc;

use alfred_config::AppConfig;
use alfred_core::tool::ToolRegistry;

/// Build the registry with every built-in tool registered.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let registry = ToolRegistry::new();

    registry.register(Arc::new(ShellTool::new(
        config.shell.timeout_secs,
        config.shell.protected_items.clone(),
    )));
    registry.register(Arc::new(FileReadTool));
    registry.register(Arc::new(FileWriteTool::new(config.shell.protected_items.clone())));
    registry.register(Arc::new(WebSearchTool::new(config.search.api_key.clone())));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_registers_builtins() {
        let config = AppConfig::default();
        let registry = default_registry(&config);

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["read_file", "search_web", "shell_exec", "write_file"]);
    }

    #[test]
    fn builtins_are_visible_to_every_role() {
        let config = AppConfig::default();
        let registry = default_registry(&config);

        for role in ["ceo", "web_surfer", "sysadmin", "researcher"] {
            let defs = registry.definitions_for_role(role);
            assert_eq!(defs.len(), 4, "role {role} should see all built-ins");
        }
    }
}
