//! Enrichment gate decision logic

use crate::ThresholdConfig;
use inbox_domain::{RankedNote, Scores};
use serde::Serialize;
use std::fmt;

/// Outcome of gating a ranked note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    /// Weighted composite of the three scores
    pub composite: f64,

    /// Model confidence the decision was made with
    pub confidence: f64,

    /// Whether the note should be enriched
    pub passed: bool,

    /// Rejection reasons (empty when passed)
    pub reasons: Vec<RejectionReason>,
}

/// Reasons for not enriching a note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Composite score under the threshold
    BelowThreshold {
        /// Computed composite
        composite: f64,
        /// Configured threshold
        threshold: f64,
    },

    /// Model confidence under the minimum
    LowConfidence {
        /// Model confidence
        confidence: f64,
        /// Configured minimum
        min_confidence: f64,
    },

    /// Ranking failed; the note is parked for manual review
    NeedsReview,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BelowThreshold {
                composite,
                threshold,
            } => write!(f, "composite {:.2} below threshold {:.2}", composite, threshold),
            RejectionReason::LowConfidence {
                confidence,
                min_confidence,
            } => write!(
                f,
                "confidence {:.2} below minimum {:.2}",
                confidence, min_confidence
            ),
            RejectionReason::NeedsReview => f.write_str("ranking failed, needs review"),
        }
    }
}

/// Composites are rounded to `1 / COMPOSITE_SCALE`
const COMPOSITE_SCALE: f64 = 1e9;

/// The Gatekeeper decides which ranked notes are worth enriching
///
/// Pure: no side effects and no external calls.
///
/// # Examples
///
/// ```
/// use inbox_domain::{Category, ClassifiedNote, RankedNote, RawNote, Scores};
/// use inbox_gatekeeper::{Gatekeeper, ThresholdConfig};
///
/// let classified = ClassifiedNote {
///     note: RawNote::new("n1", "Production outage", 0),
///     project: "Work".to_string(),
///     category: Category::Task,
///     reasoning: String::new(),
///     new_project: false,
/// };
/// let ranked = RankedNote::new(classified, "Fix outage", Scores::new(0.9, 0.95, 0.9), 0.9, "");
///
/// let gatekeeper = Gatekeeper::new(ThresholdConfig::default());
/// assert!(gatekeeper.should_enrich(&ranked));
/// ```
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: ThresholdConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ThresholdConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Weighted mean of the three scores, rounded to nine decimal places
    ///
    /// Weights whose sum is not positive fall back to equal weighting.
    /// Rounding keeps a mean that is exactly the threshold in decimal
    /// arithmetic on the passing side of the inclusive boundary.
    pub fn composite(&self, scores: &Scores) -> f64 {
        let weights = &self.config.weights;
        let total = weights.total();
        let raw = if total.is_nan() || total <= 0.0 {
            (scores.importance + scores.urgency + scores.impact) / 3.0
        } else {
            (weights.importance * scores.importance
                + weights.urgency * scores.urgency
                + weights.impact * scores.impact)
                / total
        };
        (raw * COMPOSITE_SCALE).round() / COMPOSITE_SCALE
    }

    /// Gate a ranked note, explaining any rejection
    pub fn evaluate(&self, ranked: &RankedNote) -> GateDecision {
        let composite = self.composite(&ranked.scores);
        let mut reasons = Vec::new();

        if ranked.needs_review {
            reasons.push(RejectionReason::NeedsReview);
        }
        if composite < self.config.threshold {
            reasons.push(RejectionReason::BelowThreshold {
                composite,
                threshold: self.config.threshold,
            });
        }
        if ranked.confidence < self.config.min_confidence {
            reasons.push(RejectionReason::LowConfidence {
                confidence: ranked.confidence,
                min_confidence: self.config.min_confidence,
            });
        }

        GateDecision {
            composite,
            confidence: ranked.confidence,
            passed: reasons.is_empty(),
            reasons,
        }
    }

    /// Whether `ranked` should be enriched
    pub fn should_enrich(&self, ranked: &RankedNote) -> bool {
        self.evaluate(ranked).passed
    }
}

/// Whether `ranked` should be enriched under `config`
pub fn should_enrich(ranked: &RankedNote, config: &ThresholdConfig) -> bool {
    Gatekeeper::new(*config).should_enrich(ranked)
}
