//! Metrics collection for pipeline runs

use crate::outcome::NoteOutcome;
use inbox_processor::Stage;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts collected over one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineMetrics {
    /// Notes that produced a stored task (degraded ones included)
    pub stored: usize,

    /// Notes the gate declined to enrich
    pub filtered: usize,

    /// Failures per stage
    pub failed: BTreeMap<Stage, usize>,

    /// Stored tasks whose enrichment failed
    pub degraded: usize,

    /// Notes abandoned by cancellation
    pub cancelled: usize,

    /// Wall-clock time for the batch (milliseconds)
    pub elapsed_ms: u64,
}

impl PipelineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally one note outcome
    pub fn record(&mut self, outcome: &NoteOutcome) {
        match outcome {
            NoteOutcome::Stored {
                enrichment_error, ..
            } => {
                self.stored += 1;
                if enrichment_error.is_some() {
                    self.degraded += 1;
                }
            }
            NoteOutcome::FilteredOut(_) => self.filtered += 1,
            NoteOutcome::Failed { stage, .. } => *self.failed.entry(*stage).or_insert(0) += 1,
            NoteOutcome::Cancelled => self.cancelled += 1,
        }
    }

    /// Failures across all stages
    pub fn total_failed(&self) -> usize {
        self.failed.values().sum()
    }

    /// Notes seen
    pub fn total(&self) -> usize {
        self.stored + self.filtered + self.total_failed() + self.cancelled
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Summary".to_string(),
            "================".to_string(),
            format!("Notes: {}", self.total()),
            format!("Stored: {}", self.stored),
            format!("Filtered out: {}", self.filtered),
            format!("Failed: {}", self.total_failed()),
        ];

        for stage in Stage::ALL {
            if let Some(count) = self.failed.get(&stage) {
                lines.push(format!("  {}: {}", stage, count));
            }
        }

        if self.degraded > 0 {
            lines.push(format!("Degraded (stored without enrichment): {}", self.degraded));
        }
        if self.cancelled > 0 {
            lines.push(format!("Cancelled: {}", self.cancelled));
        }
        lines.push(format!("Elapsed: {}ms", self.elapsed_ms));

        lines.join("\n")
    }
}
