//! Error types for the pipeline stages

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Classification (including input validation)
    Route,
    /// Scoring
    Rank,
    /// Enrichment
    Enrich,
    /// Persistence
    Store,
}

impl Stage {
    /// Every stage, in pipeline order
    pub const ALL: [Stage; 4] = [Stage::Route, Stage::Rank, Stage::Enrich, Stage::Store];

    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Route => "route",
            Stage::Rank => "rank",
            Stage::Enrich => "enrich",
            Stage::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a single note's trip through the pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// The note cannot be processed at all
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Classification failed after retries
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Ranking failed after retries
    #[error("Ranking failed: {0}")]
    Ranking(String),

    /// Enrichment failed after retries
    #[error("Enrichment failed: {0}")]
    Enrichment(String),

    /// The task store rejected the record
    #[error("Store failed: {0}")]
    Store(String),

    /// The note's task panicked while in `stage`
    #[error("Panicked during {stage}: {message}")]
    Panicked {
        /// Stage the note had reached
        stage: Stage,
        /// Panic payload, when it was a string
        message: String,
    },
}

impl StageError {
    /// Stage the error is reported under
    pub fn stage(&self) -> Stage {
        match self {
            StageError::InvalidInput(_) | StageError::Classification(_) => Stage::Route,
            StageError::Ranking(_) => Stage::Rank,
            StageError::Enrichment(_) => Stage::Enrich,
            StageError::Store(_) => Stage::Store,
            StageError::Panicked { stage, .. } => *stage,
        }
    }
}

/// Failure of one structured completion call, after retries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The completion service failed
    #[error("completion service error: {message}")]
    Service {
        /// Service error text
        message: String,
        /// Whether the service marked it retryable
        retryable: bool,
    },

    /// The output could not be decoded into the expected shape
    #[error("undecodable output: {0}")]
    Decode(String),
}

impl CallError {
    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CallError::Service { retryable, .. } => *retryable,
            CallError::Decode(_) => true,
        }
    }
}
