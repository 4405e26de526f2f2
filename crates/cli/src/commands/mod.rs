//! Command implementations and shared session wiring.

pub mod chat;
pub mod onboard;
pub mod run;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use alfred_agent::{AgentLoop, CommandReflector, DelegateTool, ProviderReflector};
use alfred_config::AppConfig;
use alfred_core::memory::{render_history, HistoryTurn, MemoryProvider};
use alfred_core::provider::CompletionBackend;
use alfred_core::status::StatusSink;
use alfred_memory::{InMemoryStore, SqliteStore};
use alfred_providers::{CredentialPool, RotatingClient};
use alfred_tools::{default_registry, RememberFactTool};

/// Prints progress lines to stderr so they never mix with the answer.
struct ConsoleSink;

#[async_trait]
impl StatusSink for ConsoleSink {
    async fn notify(&self, message: &str) {
        eprintln!("  · {message}");
    }
}

/// Everything one session needs: the loop plus its memory provider.
pub struct Session {
    pub agent: AgentLoop,
    pub memory: Arc<dyn MemoryProvider>,
    pub history_window: usize,
}

impl Session {
    /// Run one task against the session memory: recall, reason, record.
    pub async fn ask(&self, task: &str) -> String {
        let history = match self.memory.recent_history(self.history_window).await {
            Ok(turns) => render_history(&turns),
            Err(e) => {
                warn!(error = %e, "History recall failed; continuing without it");
                String::new()
            }
        };
        let facts = self.memory.fact_summary().await.unwrap_or_else(|e| {
            warn!(error = %e, "Fact recall failed; continuing without it");
            String::new()
        });

        let answer = self.agent.run(task, &history, &facts).await;

        if let Err(e) = self.memory.record_turn(HistoryTurn::user(task)).await {
            warn!(error = %e, "Failed to record user turn");
        }
        if let Err(e) = self.memory.record_turn(HistoryTurn::agent(&answer)).await {
            warn!(error = %e, "Failed to record agent turn");
        }

        answer
    }
}

/// Build a session from the resolved configuration.
pub async fn build_session(role: Option<String>) -> Result<Session, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_credentials() {
        eprintln!();
        eprintln!("  ERROR: No API keys configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (comma-separated for a pool):");
        eprintln!("    ALFRED_API_KEYS=key1,key2");
        eprintln!("    GEMINI_API_KEYS=key1,key2");
        eprintln!();
        eprintln!("  Or add them to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API keys found. See above for setup instructions.".into());
    }

    let pool = Arc::new(CredentialPool::new(config.api_keys.clone()));
    let backend: Arc<dyn CompletionBackend> =
        Arc::new(RotatingClient::gemini(Arc::clone(&pool), &config.model));
    let reflector_backend =
        Arc::new(RotatingClient::gemini(Arc::clone(&pool), &config.reflector_model));
    let reflector: Arc<dyn CommandReflector> =
        Arc::new(ProviderReflector::new(reflector_backend));

    let memory: Arc<dyn MemoryProvider> = if config.memory.backend == "sqlite" {
        let path = config.memory_db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Arc::new(SqliteStore::new(&path.display().to_string()).await?)
    } else {
        Arc::new(InMemoryStore::new())
    };

    // Session-bound tools go in after their collaborators exist.
    let registry = Arc::new(default_registry(&config));
    registry.register(Arc::new(RememberFactTool::new(Arc::clone(&memory))));
    registry.register(Arc::new(
        DelegateTool::new(Arc::clone(&backend), Arc::clone(&registry), Arc::clone(&reflector))
        .with_temperature(config.temperature)
        .with_max_iterations(config.max_iterations),
    ));

    let agent = AgentLoop::new(backend, registry, reflector)
        .with_role(role.unwrap_or_else(|| config.role.clone()))
        .with_temperature(config.temperature)
        .with_max_iterations(config.max_iterations)
        .with_status_sink(Arc::new(ConsoleSink));

    Ok(Session { agent, memory, history_window: config.memory.history_window })
}
