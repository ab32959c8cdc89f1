//! Classification: raw note → project and category

use crate::config::{MetadataConfig, RetryPolicy};
use crate::error::StageError;
use crate::prompt::classification_request;
use crate::retry::request_structured;
use inbox_domain::{Category, ClassifiedNote, CompletionService, RawNote};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ClassificationOutput {
    project: String,
    category: String,
    #[serde(default)]
    reasoning: String,
}

/// Decoded classification before it is attached to the note
#[derive(Debug)]
struct Routing {
    project: String,
    category: Category,
    reasoning: String,
    new_project: bool,
}

/// Lowercase with runs of whitespace collapsed to one space
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The canonical known project matching `candidate`, if any
pub fn match_known_project<'a>(candidate: &str, known_projects: &'a [String]) -> Option<&'a str> {
    let wanted = normalize(candidate);
    known_projects
        .iter()
        .find(|known| normalize(known) == wanted)
        .map(|known| known.as_str())
}

fn decode(value: Value, known_projects: &[String]) -> Result<Routing, String> {
    let output: ClassificationOutput =
        serde_json::from_value(value).map_err(|e| format!("bad classification shape: {}", e))?;

    let project = output.project.split_whitespace().collect::<Vec<_>>().join(" ");
    if project.is_empty() {
        return Err("empty project".to_string());
    }

    let category: Category = output.category.parse().map_err(|e| format!("{}", e))?;

    let (project, new_project) = match match_known_project(&project, known_projects) {
        Some(canonical) => (canonical.to_string(), false),
        None => (project, true),
    };

    Ok(Routing {
        project,
        category,
        reasoning: output.reasoning.trim().to_string(),
        new_project,
    })
}

/// Classifies raw notes into a project and category
///
/// Routing is open-world: a project the model proposes that is not among the
/// known projects is accepted and flagged as new.
pub struct MetadataProcessor<C: ?Sized> {
    service: Arc<C>,
    config: MetadataConfig,
    retry: RetryPolicy,
}

impl<C> MetadataProcessor<C>
where
    C: CompletionService + ?Sized,
{
    /// Create a new MetadataProcessor
    pub fn new(service: Arc<C>, config: MetadataConfig, retry: RetryPolicy) -> Self {
        Self {
            service,
            config,
            retry,
        }
    }

    /// Classify `note` against `known_projects`
    ///
    /// # Errors
    ///
    /// - [`StageError::InvalidInput`] for blank or over-long text (no
    ///   service call is made)
    /// - [`StageError::Classification`] when the service fails or its output
    ///   cannot be decoded after retries
    pub async fn classify(
        &self,
        note: &RawNote,
        known_projects: &[String],
    ) -> Result<ClassifiedNote, StageError> {
        if note.is_blank() {
            return Err(StageError::InvalidInput("note text is empty".to_string()));
        }
        let length = note.text.chars().count();
        if length > self.config.max_text_length {
            return Err(StageError::InvalidInput(format!(
                "note too long: {} chars (max: {})",
                length, self.config.max_text_length
            )));
        }

        let request = classification_request(note, known_projects, self.config.model.clone());
        let routing = request_structured(self.service.as_ref(), &request, &self.retry, |value| {
            decode(value, known_projects)
        })
        .await
        .map_err(|e| StageError::Classification(e.to_string()))?;

        info!(
            project = %routing.project,
            category = %routing.category,
            new_project = routing.new_project,
            "Note classified"
        );

        Ok(ClassifiedNote {
            note: note.clone(),
            project: routing.project,
            category: routing.category,
            reasoning: routing.reasoning,
            new_project: routing.new_project,
        })
    }
}
