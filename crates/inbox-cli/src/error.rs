//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline configuration error
    #[error(transparent)]
    Pipeline(#[from] inbox_pipeline::PipelineError),

    /// Completion backend error
    #[error("LLM error: {0}")]
    Llm(#[from] inbox_llm::LlmError),

    /// Task store error
    #[error("Store error: {0}")]
    Store(#[from] inbox_store::StoreError),

    /// A single-note stage failed
    #[error(transparent)]
    Stage(#[from] inbox_processor::StageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
