//! Inbox Agent Storage Layer
//!
//! Implements the `TaskStore` trait from `inbox-domain`.
//!
//! # Stores
//!
//! - [`SqliteTaskStore`]: persistent store backed by SQLite
//! - [`MemoryTaskStore`]: in-process store for tests and dry runs
//!
//! Both de-duplicate by source note: creating a record for a note that
//! already has one returns the existing id and writes nothing.
//!
//! # Examples
//!
//! ```no_run
//! use inbox_store::SqliteTaskStore;
//!
//! let store = SqliteTaskStore::new("inbox.db").unwrap();
//! // Store is now ready for task operations
//! ```

#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use inbox_domain::TaskRecord;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The record was rejected by the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store refused the request for now
    #[error("Rate limited")]
    RateLimited,

    /// The store rejected our credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid data read back from storage
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Internal lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Lock,

    /// A blocking database task did not complete
    #[error("Store task failed: {0}")]
    Task(String),
}

/// Reject records no store should accept
pub(crate) fn validate_record(record: &TaskRecord) -> Result<(), StoreError> {
    if record.title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    if record.project.trim().is_empty() {
        return Err(StoreError::Validation("project must not be empty".to_string()));
    }
    if record.source_note_id.as_str().is_empty() {
        return Err(StoreError::Validation(
            "source_note_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Current time in seconds since the Unix epoch
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
