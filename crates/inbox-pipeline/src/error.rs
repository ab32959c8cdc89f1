//! Error types for building and configuring a pipeline

use thiserror::Error;

/// Errors raised before a batch starts
///
/// Per-note problems never surface here; they are reported as
/// [`NoteOutcome::Failed`](crate::NoteOutcome::Failed).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A configuration value is out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration could not be rendered as TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

impl From<inbox_gatekeeper::GatekeeperError> for PipelineError {
    fn from(err: inbox_gatekeeper::GatekeeperError) -> Self {
        PipelineError::Config(format!("gate: {}", err))
    }
}
