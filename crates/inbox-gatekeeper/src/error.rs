//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur when configuring the gate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// A threshold lies outside [0.0, 1.0]
    #[error("{name} must be within [0.0, 1.0], got {value}")]
    ThresholdOutOfRange {
        /// Setting name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Weights are negative, non-finite, or sum to zero
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}
