//! Per-note outcomes and batch results

use crate::metrics::PipelineMetrics;
use inbox_domain::{NoteId, Priority, RankedNote, RecordId, TaskStatus};
use inbox_gatekeeper::GateDecision;
use inbox_processor::{Stage, StageError};
use serde::{Serialize, Serializer};
use std::time::Duration;

fn display<S: Serializer>(error: &StageError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// What happened to one note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NoteOutcome {
    /// A task record was submitted and accepted by the store
    Stored {
        /// Store-assigned id (the existing id on a rerun)
        record_id: RecordId,
        /// Priority written to the record
        priority: Priority,
        /// Status written to the record
        status: TaskStatus,
        /// Set when enrichment failed and a minimal task was stored instead
        #[serde(skip_serializing_if = "Option::is_none")]
        enrichment_error: Option<String>,
    },

    /// The gate declined to enrich the note; nothing was stored
    FilteredOut(GateDecision),

    /// A stage failed; nothing was stored
    Failed {
        /// Stage the failure is attributed to
        stage: Stage,
        /// The stage error
        #[serde(serialize_with = "display")]
        error: StageError,
    },

    /// The batch was cancelled before the note finished
    Cancelled,
}

impl NoteOutcome {
    /// Outcome for a stage error
    pub fn failed(error: StageError) -> Self {
        NoteOutcome::Failed {
            stage: error.stage(),
            error,
        }
    }

    /// Short label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            NoteOutcome::Stored {
                enrichment_error: Some(_),
                ..
            } => "stored (degraded)",
            NoteOutcome::Stored { .. } => "stored",
            NoteOutcome::FilteredOut(_) => "filtered_out",
            NoteOutcome::Failed { .. } => "failed",
            NoteOutcome::Cancelled => "cancelled",
        }
    }

    /// Whether a record was stored
    pub fn is_stored(&self) -> bool {
        matches!(self, NoteOutcome::Stored { .. })
    }
}

/// One note's result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteReport {
    /// Note the report is about
    pub note_id: NoteId,

    /// What happened
    #[serde(flatten)]
    pub outcome: NoteOutcome,

    /// The review-queue entry, when ranking failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<RankedNote>,
}

impl NoteReport {
    /// Report without a review entry
    pub fn new(note_id: NoteId, outcome: NoteOutcome) -> Self {
        Self {
            note_id,
            outcome,
            review: None,
        }
    }
}

/// Result of a batch run, one report per input note in input order
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Per-note reports
    pub reports: Vec<NoteReport>,

    /// Counts for the batch
    pub metrics: PipelineMetrics,
}

impl PipelineResult {
    /// Collect reports and tally their metrics
    pub fn from_reports(reports: Vec<NoteReport>, elapsed: Duration) -> Self {
        let mut metrics = PipelineMetrics::new();
        for report in &reports {
            metrics.record(&report.outcome);
        }
        metrics.elapsed_ms = elapsed.as_millis() as u64;
        Self { reports, metrics }
    }

    /// Notes parked for manual review
    pub fn review_queue(&self) -> Vec<&RankedNote> {
        self.reports.iter().filter_map(|r| r.review.as_ref()).collect()
    }

    /// Reports for failed notes
    pub fn failures(&self) -> Vec<&NoteReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, NoteOutcome::Failed { .. }))
            .collect()
    }

    /// Report for a given note
    pub fn report(&self, note_id: &NoteId) -> Option<&NoteReport> {
        self.reports.iter().find(|r| &r.note_id == note_id)
    }

    /// Number of notes processed
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether the batch was empty
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
