//! Configuration loading, validation, and management for alfred.
//!
//! Loads configuration from `~/.alfred/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Credentials are a comma-separated list of provider API keys; the
//! completion client rotates through them round-robin to survive rate
//! limits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.alfred/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent display name
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Provider API keys, rotated round-robin
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Model used for the main reasoning loop
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for the reflector (slower, more deliberate)
    #[serde(default = "default_reflector_model")]
    pub reflector_model: String,

    /// Default sampling temperature for the reasoning loop
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum reasoning iterations per task (hard ceiling)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Default role for the top-level agent
    #[serde(default = "default_role")]
    pub role: String,

    /// Shell tool settings
    #[serde(default)]
    pub shell: ShellConfig,

    /// Memory backend settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_agent_name() -> String {
    "Alfred".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_reflector_model() -> String {
    "gemini-2.5-pro".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    15
}
fn default_role() -> String {
    "all".into()
}

/// Redact a secret for Debug output.
fn redact_keys(keys: &[String]) -> String {
    format!("[{} key(s) redacted]", keys.len())
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("agent_name", &self.agent_name)
            .field("api_keys", &redact_keys(&self.api_keys))
            .field("model", &self.model)
            .field("reflector_model", &self.reflector_model)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("role", &self.role)
            .field("shell", &self.shell)
            .field("memory", &self.memory)
            .field("search", &self.search)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Command timeout in seconds
    #[serde(default = "default_shell_timeout")]
    pub timeout_secs: u64,

    /// Files and directories the shell tool refuses to delete or move
    #[serde(default = "default_protected_items")]
    pub protected_items: Vec<String>,
}

fn default_shell_timeout() -> u64 {
    300
}

fn default_protected_items() -> Vec<String> {
    vec![
        ".env".into(),
        ".git".into(),
        "/etc".into(),
        "/boot".into(),
        "/bin".into(),
        "config.toml".into(),
    ]
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shell_timeout(),
            protected_items: default_protected_items(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite database path (relative paths resolve under the config dir)
    #[serde(default = "default_memory_path")]
    pub path: String,

    /// How many recent turns to inject into each task prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}
fn default_memory_path() -> String {
    "memory/alfred_chat.db".into()
}
fn default_history_window() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_memory_path(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API key (Tavily-compatible). Missing key degrades the tool
    /// to an explanatory text result instead of disabling the agent.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.alfred/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `ALFRED_API_KEYS` / `GEMINI_API_KEYS` — comma-separated key list
    /// - `ALFRED_MODEL`, `ALFRED_REFLECTOR_MODEL`
    /// - `TAVILY_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let env_keys = std::env::var("ALFRED_API_KEYS")
            .ok()
            .or_else(|| std::env::var("GEMINI_API_KEYS").ok());
        if let Some(raw) = env_keys {
            self.api_keys = parse_key_list(&raw);
        }

        if let Ok(model) = std::env::var("ALFRED_MODEL") {
            self.model = model;
        }
        if let Ok(model) = std::env::var("ALFRED_REFLECTOR_MODEL") {
            self.reflector_model = model;
        }
        if self.search.api_key.is_none() {
            self.search.api_key = std::env::var("TAVILY_API_KEY").ok();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".alfred")
    }

    /// Resolve the memory database path (relative paths live under the
    /// config dir).
    pub fn memory_db_path(&self) -> PathBuf {
        let path = Path::new(&self.memory.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Self::config_dir().join(path)
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self.shell.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "shell.timeout_secs must be at least 1".into(),
            ));
        }

        match self.memory.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown memory backend '{other}' (expected 'sqlite' or 'in_memory')"
                )));
            }
        }

        Ok(())
    }

    /// Whether any provider credential is available.
    pub fn has_credentials(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Generate a default config TOML string (for first-run onboarding).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            api_keys: vec![],
            model: default_model(),
            reflector_model: default_reflector_model(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            role: default_role(),
            shell: ShellConfig::default(),
            memory: MemoryConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Split a comma-separated credential list, dropping empty entries.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
