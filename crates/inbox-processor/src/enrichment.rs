//! Enrichment: ranked note → summary, subtasks and suggested actions

use crate::config::{EnrichmentConfig, RetryPolicy};
use crate::error::StageError;
use crate::prompt::{enrichment_request, LENSES};
use crate::retry::request_structured;
use inbox_domain::{CompletionService, EnrichedNote, RankedNote};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct EnrichmentOutput {
    summary: String,
    #[serde(default)]
    subtasks: Vec<String>,
    #[serde(default)]
    suggested_actions: Vec<String>,
    #[serde(default)]
    lenses: Vec<String>,
}

/// Keep at most `max_words` words, marking the cut with "..."
///
/// # Examples
///
/// ```
/// use inbox_processor::enrichment::cap_words;
///
/// assert_eq!(cap_words("one two three", 5), "one two three");
/// assert_eq!(cap_words("one two three", 2), "one two...");
/// ```
pub fn cap_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.trim().to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

/// Trim entries, drop blank ones, keep at most `max_items`
fn clean_list(items: Vec<String>, max_items: usize) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .take(max_items)
        .collect()
}

/// Map lens letters ("A".."D") to names; keep anything else as given
fn lens_name(raw: &str) -> String {
    let raw = raw.trim();
    let letter = raw
        .strip_prefix("Lens ")
        .or_else(|| raw.strip_prefix("LENS "))
        .unwrap_or(raw);
    match letter {
        "A" | "a" => LENSES[0].0.to_string(),
        "B" | "b" => LENSES[1].0.to_string(),
        "C" | "c" => LENSES[2].0.to_string(),
        "D" | "d" => LENSES[3].0.to_string(),
        _ => raw.to_string(),
    }
}

fn decode(value: Value, config: &EnrichmentConfig) -> Result<EnrichmentOutput, String> {
    let output: EnrichmentOutput =
        serde_json::from_value(value).map_err(|e| format!("bad enrichment shape: {}", e))?;

    if output.summary.trim().is_empty() {
        return Err("empty summary".to_string());
    }

    Ok(EnrichmentOutput {
        summary: cap_words(&output.summary, config.max_summary_words),
        subtasks: clean_list(output.subtasks, config.max_list_items),
        suggested_actions: clean_list(output.suggested_actions, config.max_list_items),
        lenses: clean_list(output.lenses, LENSES.len())
            .iter()
            .map(|l| lens_name(l))
            .collect(),
    })
}

/// Deepens notes that passed the gate
pub struct EnrichmentProcessor<C: ?Sized> {
    service: Arc<C>,
    config: EnrichmentConfig,
    retry: RetryPolicy,
}

impl<C> EnrichmentProcessor<C>
where
    C: CompletionService + ?Sized,
{
    /// Create a new EnrichmentProcessor
    pub fn new(service: Arc<C>, config: EnrichmentConfig, retry: RetryPolicy) -> Self {
        Self {
            service,
            config,
            retry,
        }
    }

    /// Enrich `ranked`
    ///
    /// # Errors
    ///
    /// [`StageError::Enrichment`] when the service fails or its output cannot
    /// be decoded after retries. An empty summary counts as undecodable.
    pub async fn enrich(&self, ranked: &RankedNote) -> Result<EnrichedNote, StageError> {
        let request = enrichment_request(
            ranked,
            self.config.max_summary_words,
            self.config.max_list_items,
            self.config.model.clone(),
        );
        let config = &self.config;
        let output = request_structured(self.service.as_ref(), &request, &self.retry, |value| {
            decode(value, config)
        })
        .await
        .map_err(|e| StageError::Enrichment(e.to_string()))?;

        info!(
            subtasks = output.subtasks.len(),
            actions = output.suggested_actions.len(),
            lenses = ?output.lenses,
            "Note enriched"
        );

        Ok(EnrichedNote {
            ranked: ranked.clone(),
            summary: output.summary,
            suggested_actions: output.suggested_actions,
            subtasks: output.subtasks,
            lenses: output.lenses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cap_words() {
        assert_eq!(cap_words("  a b  c ", 3), "a b  c");
        assert_eq!(cap_words("a b c d", 3), "a b c...");
        assert_eq!(cap_words("", 3), "");
    }

    #[test]
    fn test_clean_list() {
        let items = vec![" one ".into(), "".into(), "  ".into(), "two".into(), "three".into()];
        assert_eq!(clean_list(items, 2), vec!["one", "two"]);
    }

    #[test]
    fn test_lens_names() {
        assert_eq!(lens_name("A"), "First Principles");
        assert_eq!(lens_name("Lens C"), "80/20");
        assert_eq!(lens_name("Inversion"), "Inversion");
    }

    #[test]
    fn test_decode_rejects_empty_summary() {
        let config = EnrichmentConfig::default();
        assert!(decode(json!({"summary": "   "}), &config).is_err());
        assert!(decode(json!({"subtasks": []}), &config).is_err());
    }

    #[test]
    fn test_decode_applies_limits() {
        let config = EnrichmentConfig {
            max_summary_words: 3,
            max_list_items: 2,
            ..Default::default()
        };
        let output = decode(
            json!({
                "summary": "Restore service then write the postmortem",
                "subtasks": ["a", "", "b", "c"],
                "suggested_actions": [],
                "lenses": ["B", "C"]
            }),
            &config,
        )
        .unwrap();

        assert_eq!(output.summary, "Restore service then...");
        assert_eq!(output.subtasks, vec!["a", "b"]);
        assert!(output.suggested_actions.is_empty());
        assert_eq!(output.lenses, vec!["Inversion", "80/20"]);
    }
}
