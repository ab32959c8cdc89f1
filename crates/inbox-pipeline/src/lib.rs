//! Inbox Agent Pipeline
//!
//! Turns a batch of raw notes into stored, ranked tasks.
//!
//! # Overview
//!
//! Each note runs through five stages, strictly in order:
//!
//! | Stage | Component | On failure |
//! |-------|-----------|------------|
//! | **Route** | `MetadataProcessor` | `failed(route)` |
//! | **Rank** | `RankingProcessor` | review queue + `failed(rank)` |
//! | **Filter** | `Gatekeeper` | (cannot fail) → `filtered_out` when rejected |
//! | **Enrich** | `EnrichmentProcessor` | minimal task is stored instead |
//! | **Store** | `TaskStore` | `failed(store)` |
//!
//! Notes are independent. A failure in one note never affects another, and
//! the batch itself never fails. The store is always called for notes that
//! reach it; de-duplication by source note is the store's job, so reruns are
//! idempotent.
//!
//! # Usage
//!
//! ```
//! use inbox_domain::RawNote;
//! use inbox_llm::MockProvider;
//! use inbox_pipeline::{InboxConfig, NoteOutcome, Pipeline};
//! use inbox_store::MemoryTaskStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let llm = MockProvider::default();
//! llm.add_reply("classification", "", json!({"project": "Home", "category": "task"}));
//! llm.add_reply("ranking", "", json!({
//!     "importance": 0.1, "urgency": 0.2, "impact": 0.1, "confidence": 0.9
//! }));
//!
//! let store = Arc::new(MemoryTaskStore::new());
//! let pipeline = Pipeline::new(Arc::new(llm), store.clone(), &InboxConfig::default()).unwrap();
//!
//! let result = pipeline.run(vec![RawNote::new("n1", "Buy milk", 0)]).await;
//! assert!(matches!(result.reports[0].outcome, NoteOutcome::FilteredOut(_)));
//! assert!(store.is_empty());
//! println!("{}", result.metrics.summary());
//! # });
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [gate]
//! threshold = 0.5
//! min_confidence = 0.5
//!
//! [gate.weights]
//! importance = 1.0
//! urgency = 1.0
//! impact = 1.0
//!
//! [retry]
//! max_attempts = 2
//! backoff_ms = 500
//!
//! [pipeline]
//! known_projects = ["Home", "Work"]
//! concurrency = 4
//! ambiguity_threshold = 0.9
//! ```
//!
//! # Observability
//!
//! Every note is processed inside a `note` span carrying its `note_id`.
//! Stage outputs are emitted as JSON on the `inbox::artifact` target at
//! debug level.

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod orchestrator;
mod outcome;
mod registry;
mod task;

pub use config::{InboxConfig, PipelineSettings};
pub use error::PipelineError;
pub use metrics::PipelineMetrics;
pub use orchestrator::{Pipeline, ARTIFACT_TARGET};
pub use outcome::{NoteOutcome, NoteReport, PipelineResult};
pub use registry::ProjectRegistry;
pub use task::TaskAssembler;
