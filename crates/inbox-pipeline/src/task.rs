//! Projection of finished notes into task records

use inbox_domain::{EnrichedNote, Priority, RankedNote, TaskRecord, TaskStatus};
use inbox_gatekeeper::Gatekeeper;

/// Builds the [`TaskRecord`] for a note reaching the store stage
///
/// The mapping is deterministic: the same note always yields the same record.
#[derive(Debug, Clone)]
pub struct TaskAssembler {
    gatekeeper: Gatekeeper,
    ambiguity_threshold: f64,
}

impl TaskAssembler {
    /// Create an assembler scoring with `gatekeeper`'s weights
    pub fn new(gatekeeper: Gatekeeper, ambiguity_threshold: f64) -> Self {
        Self {
            gatekeeper,
            ambiguity_threshold,
        }
    }

    /// Full task from an enriched note
    pub fn from_enriched(&self, enriched: &EnrichedNote) -> TaskRecord {
        self.assemble(&enriched.ranked, Some(enriched))
    }

    /// Minimal task from a ranked note whose enrichment failed
    pub fn minimal(&self, ranked: &RankedNote) -> TaskRecord {
        self.assemble(ranked, None)
    }

    /// Status for a given model confidence
    pub fn status(&self, confidence: f64) -> TaskStatus {
        if confidence < self.ambiguity_threshold {
            TaskStatus::Ambiguous
        } else {
            TaskStatus::Processed
        }
    }

    fn assemble(&self, ranked: &RankedNote, enriched: Option<&EnrichedNote>) -> TaskRecord {
        let composite = self.gatekeeper.composite(&ranked.scores);
        TaskRecord {
            title: ranked.title.clone(),
            project: ranked.project().to_string(),
            priority: Priority::from_composite(composite),
            status: self.status(ranked.confidence),
            body: render_body(ranked, enriched, composite),
            source_note_id: ranked.id().clone(),
        }
    }
}

fn render_body(ranked: &RankedNote, enriched: Option<&EnrichedNote>, composite: f64) -> String {
    let mut body = String::new();

    if let Some(enriched) = enriched {
        body.push_str(&format!("## Summary\n\n{}\n\n", enriched.summary));

        if !enriched.subtasks.is_empty() {
            body.push_str("## Subtasks\n\n");
            for subtask in &enriched.subtasks {
                body.push_str(&format!("- [ ] {}\n", subtask));
            }
            body.push('\n');
        }

        if !enriched.suggested_actions.is_empty() {
            body.push_str("## Suggested Actions\n\n");
            for action in &enriched.suggested_actions {
                body.push_str(&format!("- {}\n", action));
            }
            body.push('\n');
        }

        if !enriched.lenses.is_empty() {
            body.push_str(&format!("Lenses: {}\n\n", enriched.lenses.join(", ")));
        }
    }

    let scores = &ranked.scores;
    body.push_str(&format!(
        "## Scores\n\nImportance: {:.2} | Urgency: {:.2} | Impact: {:.2} | Composite: {:.2}\n",
        scores.importance, scores.urgency, scores.impact, composite
    ));
    body.push_str(&format!("Confidence: {:.2}\n", ranked.confidence));
    if !ranked.reasoning.is_empty() {
        body.push_str(&format!("Reasoning: {}\n", ranked.reasoning));
    }

    body.push_str(&format!(
        "\n## Original Note\n\n{}\n",
        ranked.classified.note.text.trim()
    ));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_domain::{Category, ClassifiedNote, RawNote, Scores};
    use inbox_gatekeeper::ThresholdConfig;

    fn ranked(confidence: f64, scores: Scores) -> RankedNote {
        let classified = ClassifiedNote {
            note: RawNote::new("n1", "Production outage: API returns 500s", 0),
            project: "Work".to_string(),
            category: Category::Task,
            reasoning: String::new(),
            new_project: false,
        };
        RankedNote::new(classified, "Fix outage", scores, confidence, "customers blocked")
    }

    fn assembler() -> TaskAssembler {
        TaskAssembler::new(Gatekeeper::default_config(), 0.9)
    }

    #[test]
    fn test_enriched_record() {
        let enriched = EnrichedNote {
            ranked: ranked(0.95, Scores::new(0.9, 1.0, 0.8)),
            summary: "Restore the API.".to_string(),
            suggested_actions: vec!["Open incident channel".to_string()],
            subtasks: vec!["Roll back".to_string(), "Write postmortem".to_string()],
            lenses: vec!["Inversion".to_string()],
        };

        let record = assembler().from_enriched(&enriched);
        assert_eq!(record.title, "Fix outage");
        assert_eq!(record.project, "Work");
        assert_eq!(record.priority, Priority::Critical);
        assert_eq!(record.status, TaskStatus::Processed);
        assert_eq!(record.source_note_id.as_str(), "n1");

        assert!(record.body.contains("## Summary\n\nRestore the API."));
        assert!(record.body.contains("- [ ] Roll back\n- [ ] Write postmortem"));
        assert!(record.body.contains("- Open incident channel"));
        assert!(record.body.contains("Composite: 0.90"));
        assert!(record.body.contains("Confidence: 0.95"));
        assert!(record.body.ends_with("Production outage: API returns 500s\n"));
    }

    #[test]
    fn test_minimal_record_omits_enrichment() {
        let record = assembler().minimal(&ranked(0.6, Scores::new(0.5, 0.5, 0.5)));
        assert_eq!(record.priority, Priority::High);
        assert_eq!(record.status, TaskStatus::Ambiguous);
        assert!(!record.body.contains("## Summary"));
        assert!(!record.body.contains("## Subtasks"));
        assert!(record.body.contains("## Scores"));
        assert!(record.body.contains("## Original Note"));
    }

    #[test]
    fn test_minimal_body_layout() {
        let record = assembler().minimal(&ranked(0.6, Scores::new(0.5, 0.5, 0.5)));
        assert_eq!(
            record.body,
            "## Scores\n\n\
             Importance: 0.50 | Urgency: 0.50 | Impact: 0.50 | Composite: 0.50\n\
             Confidence: 0.60\n\
             Reasoning: customers blocked\n\
             \n## Original Note\n\n\
             Production outage: API returns 500s\n"
        );
    }

    #[test]
    fn test_priority_uses_gate_weights() {
        let gatekeeper = Gatekeeper::new(ThresholdConfig::strict());
        let assembler = TaskAssembler::new(gatekeeper, 0.9);
        // (2*1.0 + 1.5*0 + 1*0) / 4.5 = 0.44
        let record = assembler.minimal(&ranked(1.0, Scores::new(1.0, 0.0, 0.0)));
        assert_eq!(record.priority, Priority::Medium);
    }

    #[test]
    fn test_status_boundary() {
        let assembler = assembler();
        assert_eq!(assembler.status(0.9), TaskStatus::Processed);
        assert_eq!(assembler.status(0.89), TaskStatus::Ambiguous);
    }

    #[test]
    fn test_deterministic() {
        let note = ranked(0.7, Scores::new(0.3, 0.2, 0.1));
        assert_eq!(assembler().minimal(&note), assembler().minimal(&note));
    }
}
