//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Relative weight of each score in the composite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of importance
    pub importance: f64,

    /// Weight of urgency
    pub urgency: f64,

    /// Weight of impact
    pub impact: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::equal()
    }
}

impl ScoreWeights {
    /// All three scores count the same
    pub fn equal() -> Self {
        Self {
            importance: 1.0,
            urgency: 1.0,
            impact: 1.0,
        }
    }

    /// Sum of the weights
    pub fn total(&self) -> f64 {
        self.importance + self.urgency + self.impact
    }

    /// Check that every weight is finite and non-negative with a positive sum
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        for (name, weight) in [
            ("importance", self.importance),
            ("urgency", self.urgency),
            ("impact", self.impact),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GatekeeperError::InvalidWeights(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(GatekeeperError::InvalidWeights(
                "weights must have a positive sum".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds deciding whether a ranked note is worth enriching
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum composite score (inclusive)
    pub threshold: f64,

    /// Minimum model confidence (inclusive)
    pub min_confidence: f64,

    /// Composite weights
    pub weights: ScoreWeights,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_confidence: 0.5,
            weights: ScoreWeights::equal(),
        }
    }
}

impl ThresholdConfig {
    /// Create a permissive configuration (enrich almost everything)
    pub fn permissive() -> Self {
        Self {
            threshold: 0.2,
            min_confidence: 0.3,
            weights: ScoreWeights::equal(),
        }
    }

    /// Create a strict configuration (enrich only clearly urgent, important work)
    pub fn strict() -> Self {
        Self {
            threshold: 0.7,
            min_confidence: 0.8,
            weights: ScoreWeights {
                importance: 2.0,
                urgency: 1.5,
                impact: 1.0,
            },
        }
    }

    /// Check ranges and weights
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("min_confidence", self.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GatekeeperError::ThresholdOutOfRange { name, value });
            }
        }
        self.weights.validate()
    }
}
