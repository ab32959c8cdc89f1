//! Inbox Agent Domain Layer
//!
//! This crate contains the domain model for the inbox agent: the value each
//! pipeline stage produces, the task record handed to the store, and the trait
//! interfaces for the two external collaborators (the completion service and
//! the task store). It holds no infrastructure code.
//!
//! ## Key Concepts
//!
//! - **Note**: raw captured text awaiting processing
//! - **Stages**: `RawNote` → `ClassifiedNote` → `RankedNote` → `EnrichedNote`;
//!   each stage wraps the previous value instead of mutating it, so the full
//!   decision trail stays available for auditing
//! - **Confidence**: the model's certainty in its own output, kept separate
//!   from the note's priority scores
//! - **TaskRecord**: the one-way, deterministic projection persisted in the
//!   task store
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Adapters live in `inbox-llm` and `inbox-store`
//! - Stage logic lives in `inbox-processor`, `inbox-gatekeeper` and
//!   `inbox-pipeline`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod note;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use completion::{Completion, CompletionRequest, FieldKind, FieldSpec, OutputSchema};
pub use note::{
    clamp_unit, Category, ClassifiedNote, EnrichedNote, NoteId, ParseCategoryError, RankedNote,
    RawNote, Scores,
};
pub use task::{Priority, RecordId, StoredTask, TaskRecord, TaskStatus};
pub use traits::{CompletionService, ServiceError, TaskQuery, TaskStore};
