//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and
//! infrastructure. Implementations live in other crates.
//!
//! Both traits are async: completion and store calls are the only places the
//! pipeline suspends.

use crate::completion::{Completion, CompletionRequest};
use crate::note::NoteId;
use crate::task::{Priority, RecordId, StoredTask, TaskRecord};
use async_trait::async_trait;

/// Error reported by a completion backend
pub trait ServiceError: std::error::Error + Send + Sync + 'static {
    /// Whether one more attempt could plausibly succeed
    ///
    /// Timeouts, malformed output and quota/rate limits are retryable;
    /// configuration problems such as a missing model are not.
    fn is_retryable(&self) -> bool;
}

/// Trait for language-model completion backends
///
/// Implemented by the infrastructure layer (inbox-llm)
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Error type for completion calls
    type Error: ServiceError;

    /// Run one completion
    ///
    /// When the request carries a schema the adapter returns
    /// [`Completion::Structured`] or fails with a malformed-output error; it
    /// never hands unparsed text back for a structured request.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error>;

    /// Human-readable backend name for logs
    fn name(&self) -> &str {
        "llm"
    }
}

/// Trait for the external system of record for tasks
///
/// Implemented by the infrastructure layer (inbox-store)
///
/// Implementations used with the pipeline must de-duplicate by
/// `source_note_id`: creating a record for a note that already has one
/// returns the existing id and creates nothing. The pipeline always submits
/// and relies on this for idempotent reruns.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a task record, returning its id
    async fn create(&self, record: &TaskRecord) -> Result<RecordId, Self::Error>;

    /// Query persisted records
    async fn query(&self, query: &TaskQuery) -> Result<Vec<StoredTask>, Self::Error>;
}

/// Query criteria for retrieving tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Filter by exact project name
    pub project: Option<String>,

    /// Filter by source note
    pub source_note_id: Option<NoteId>,

    /// Filter by minimum priority
    pub min_priority: Option<Priority>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl TaskQuery {
    /// Query for the record produced from one note
    pub fn for_note(id: NoteId) -> Self {
        Self {
            source_note_id: Some(id),
            ..Default::default()
        }
    }

    /// Whether a record satisfies every filter (ignores `limit`)
    pub fn matches(&self, record: &TaskRecord) -> bool {
        if let Some(project) = &self.project {
            if &record.project != project {
                return false;
            }
        }
        if let Some(id) = &self.source_note_id {
            if &record.source_note_id != id {
                return false;
            }
        }
        if let Some(min) = self.min_priority {
            if record.priority < min {
                return false;
            }
        }
        true
    }
}
