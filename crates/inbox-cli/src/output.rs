//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use inbox_domain::{Priority, RankedNote, StoredTask};
use inbox_gatekeeper::GateDecision;
use inbox_pipeline::{NoteOutcome, NoteReport, PipelineResult};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of a batch run.
    pub fn format_result(&self, result: &PipelineResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
            OutputFormat::Quiet => Ok(result
                .reports
                .iter()
                .filter_map(|r| match &r.outcome {
                    NoteOutcome::Stored { record_id, .. } => Some(record_id.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_result_table(&self, result: &PipelineResult) -> String {
        if result.is_empty() {
            return self.colorize("No notes processed.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Note", "Outcome", "Detail"]);
        for report in &result.reports {
            builder.push_record([
                short_id(report.note_id.as_str()),
                self.outcome_label(&report.outcome),
                outcome_detail(report),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!("{}\n\n{}", table, result.metrics.summary())
    }

    fn outcome_label(&self, outcome: &NoteOutcome) -> String {
        let color = match outcome {
            NoteOutcome::Stored {
                enrichment_error: None,
                ..
            } => "green",
            NoteOutcome::Stored { .. } | NoteOutcome::Cancelled => "yellow",
            NoteOutcome::FilteredOut(_) => "blue",
            NoteOutcome::Failed { .. } => "red",
        };
        self.colorize(outcome.label(), color)
    }

    /// Format stored tasks.
    pub fn format_tasks(&self, tasks: &[StoredTask]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(tasks)?),
            OutputFormat::Table => Ok(self.format_tasks_table(tasks)),
            OutputFormat::Quiet => Ok(tasks
                .iter()
                .map(|t| t.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_tasks_table(&self, tasks: &[StoredTask]) -> String {
        if tasks.is_empty() {
            return self.colorize("No tasks found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Project", "Priority", "Status", "Title"]);
        for task in tasks {
            builder.push_record([
                short_id(task.id.as_str()),
                task.record.project.clone(),
                self.priority(task.record.priority),
                task.record.status.to_string(),
                task.record.title.clone(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a single-note gate check.
    pub fn format_check(&self, ranked: &RankedNote, decision: &GateDecision) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "ranked": ranked,
                "decision": decision,
            }))?),
            OutputFormat::Quiet => Ok(if decision.passed { "pass" } else { "filtered" }.to_string()),
            OutputFormat::Table => {
                let scores = &ranked.scores;
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["Title".to_string(), ranked.title.clone()]);
                let project = if ranked.classified.new_project {
                    format!("{} (new)", ranked.project())
                } else {
                    ranked.project().to_string()
                };
                builder.push_record(["Project".to_string(), project]);
                builder.push_record([
                    "Category".to_string(),
                    ranked.classified.category.to_string(),
                ]);
                builder.push_record([
                    "Scores".to_string(),
                    format!(
                        "importance {:.2}, urgency {:.2}, impact {:.2}",
                        scores.importance, scores.urgency, scores.impact
                    ),
                ]);
                builder.push_record(["Composite".to_string(), format!("{:.2}", decision.composite)]);
                builder.push_record(["Confidence".to_string(), format!("{:.2}", ranked.confidence)]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let verdict = if decision.passed {
                    self.success("Would be enriched and stored")
                } else {
                    let reasons: Vec<String> =
                        decision.reasons.iter().map(|r| r.to_string()).collect();
                    self.warning(&format!("Would be filtered out: {}", reasons.join("; ")))
                };
                Ok(format!("{}\n{}", table, verdict))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn priority(&self, priority: Priority) -> String {
        let color = match priority {
            Priority::Critical => "red",
            Priority::High => "magenta",
            Priority::Medium => "cyan",
            Priority::Low => "",
        };
        self.colorize(priority.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// First eight characters of an id, for tables.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn outcome_detail(report: &NoteReport) -> String {
    match &report.outcome {
        NoteOutcome::Stored {
            record_id,
            priority,
            status,
            enrichment_error,
        } => {
            let mut detail = format!("{} {} ({})", short_id(record_id.as_str()), priority, status);
            if let Some(error) = enrichment_error {
                detail.push_str(&format!(", not enriched: {}", error));
            }
            detail
        }
        NoteOutcome::FilteredOut(decision) => decision
            .reasons
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        NoteOutcome::Failed { stage, error } => {
            let mut detail = format!("{}: {}", stage, error);
            if report.review.is_some() {
                detail.push_str(" [review queue]");
            }
            detail
        }
        NoteOutcome::Cancelled => String::new(),
    }
}
