//! Inbox Agent Gatekeeper
//!
//! Decides which ranked notes are worth the cost of enrichment.
//!
//! The composite score is the weighted mean of importance, urgency and
//! impact. A note passes when its composite reaches the threshold AND the
//! model's confidence reaches the minimum; both bounds are inclusive. Notes
//! parked for review never pass.
//!
//! # Examples
//!
//! ```
//! use inbox_gatekeeper::{Gatekeeper, ThresholdConfig};
//! use inbox_domain::Scores;
//!
//! let gatekeeper = Gatekeeper::new(ThresholdConfig::default());
//! assert_eq!(gatekeeper.composite(&Scores::new(0.5, 0.5, 0.5)), 0.5);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod gate;

pub use config::{ScoreWeights, ThresholdConfig};
pub use error::GatekeeperError;
pub use gate::{should_enrich, GateDecision, Gatekeeper, RejectionReason};
