//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use inbox_pipeline::InboxConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the home directory holding config and database
const APP_DIR: &str = ".inbox-agent";

/// CLI configuration.
///
/// The pipeline sections (`[gate]`, `[metadata]`, `[ranking]`,
/// `[enrichment]`, `[retry]`, `[pipeline]`) sit at the top level next to the
/// CLI's own `[llm]`, `[store]` and `[settings]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion backend
    #[serde(default)]
    pub llm: LlmSettings,

    /// Task store
    #[serde(default)]
    pub store: StoreSettings,

    /// Display settings
    #[serde(default)]
    pub settings: Settings,

    /// Pipeline configuration
    #[serde(flatten)]
    pub inbox: InboxConfig,
}

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Local Ollama server
    Ollama,
    /// Any OpenAI-compatible chat completions endpoint
    OpenaiCompat,
}

/// Completion backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Backend kind
    pub provider: Provider,

    /// Base URL (None = the provider's default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Default model for every stage
    pub model: String,

    /// Bearer token for OpenAI-compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// HTTP timeout per request (seconds)
    pub timeout_secs: u64,

    /// Sampling temperature (OpenAI-compatible only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            endpoint: None,
            model: "llama3.2".to_string(),
            api_key: None,
            timeout_secs: inbox_llm::DEFAULT_TIMEOUT_SECS,
            temperature: None,
        }
    }
}

/// Task store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database path (None = `~/.inbox-agent/tasks.db`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl AppConfig {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(app_dir()?.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the pipeline sections and backend settings.
    pub fn validate(&self) -> Result<()> {
        self.inbox.validate()?;
        if self.llm.model.trim().is_empty() {
            return Err(CliError::Config("llm.model must not be empty".to_string()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(CliError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved SQLite database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir()?.join("tasks.db")),
        }
    }
}

fn app_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(APP_DIR))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
