//! Inbox Agent Processors
//!
//! The three model-backed pipeline stages.
//!
//! # Architecture
//!
//! ```text
//! RawNote → MetadataProcessor → ClassifiedNote
//!         → RankingProcessor  → RankedNote
//!         → (gate)            → EnrichmentProcessor → EnrichedNote
//! ```
//!
//! Every stage builds a prompt, asks the completion service for structured
//! output, decodes and normalizes it, and returns a new value extending its
//! input. Each call is retried once on retryable failures (timeouts,
//! malformed output, rate limits) with exponential backoff.
//!
//! # Example Usage
//!
//! ```
//! use inbox_domain::RawNote;
//! use inbox_llm::MockProvider;
//! use inbox_processor::{MetadataConfig, MetadataProcessor, RetryPolicy};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let llm = MockProvider::default();
//! llm.add_reply("classification", "", json!({"project": "home", "category": "task"}));
//!
//! let processor = MetadataProcessor::new(
//!     Arc::new(llm),
//!     MetadataConfig::default(),
//!     RetryPolicy::immediate(),
//! );
//!
//! let note = RawNote::new("n1", "Buy milk", 0);
//! let classified = processor.classify(&note, &["Home".to_string()]).await.unwrap();
//! assert_eq!(classified.project, "Home");
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metadata;
mod prompt;
mod ranking;
mod retry;

pub mod enrichment;


pub use config::{EnrichmentConfig, MetadataConfig, RankingConfig, RetryPolicy, MAX_ATTEMPTS};
pub use enrichment::EnrichmentProcessor;
pub use error::{CallError, Stage, StageError};
pub use metadata::{match_known_project, MetadataProcessor};
pub use prompt::{CLASSIFICATION_SCHEMA, ENRICHMENT_SCHEMA, LENSES, RANKING_SCHEMA};
pub use ranking::RankingProcessor;
