//! Task records - what the pipeline hands to the task store

use crate::note::NoteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a persisted task record, assigned by the store
///
/// Stores created by this workspace use UUIDv7 strings so record ids sort
/// chronologically; external stores may use any opaque string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an existing record identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh UUIDv7-based identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_domain::RecordId;
    ///
    /// let a = RecordId::generate();
    /// let b = RecordId::generate();
    /// assert_ne!(a, b);
    /// ```
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Priority bucket derived from the composite score
///
/// Ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Composite below 0.25
    Low,
    /// Composite in [0.25, 0.5)
    Medium,
    /// Composite in [0.5, 0.75)
    High,
    /// Composite of 0.75 or more
    Critical,
}

impl Priority {
    /// Map a composite score in [0, 1] to a priority bucket
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_domain::Priority;
    ///
    /// assert_eq!(Priority::from_composite(0.1), Priority::Low);
    /// assert_eq!(Priority::from_composite(0.5), Priority::High);
    /// assert_eq!(Priority::from_composite(0.9), Priority::Critical);
    /// ```
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 0.75 {
            Priority::Critical
        } else if composite >= 0.5 {
            Priority::High
        } else if composite >= 0.25 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Lowercase name used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// How much the pipeline trusts its own output for this task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Model confidence met the ambiguity threshold
    Processed,
    /// Model confidence fell below the ambiguity threshold
    Ambiguous,
}

impl TaskStatus {
    /// Lowercase name used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processed => "processed",
            TaskStatus::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(TaskStatus::Processed),
            "ambiguous" => Ok(TaskStatus::Ambiguous),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

/// The external representation of a finished note
///
/// Exactly one record is submitted per note reaching the store stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task title
    pub title: String,

    /// Project the task belongs to
    pub project: String,

    /// Priority bucket derived from the composite score
    pub priority: Priority,

    /// Trust level derived from model confidence
    pub status: TaskStatus,

    /// Markdown body
    pub body: String,

    /// Note this task was produced from
    pub source_note_id: NoteId,
}

/// A task record as persisted by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTask {
    /// Store-assigned identifier
    pub id: RecordId,

    /// The persisted fields
    pub record: TaskRecord,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
}
