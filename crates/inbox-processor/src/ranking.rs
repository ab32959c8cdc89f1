//! Ranking: classified note → scores, confidence and title

use crate::config::{RankingConfig, RetryPolicy};
use crate::error::StageError;
use crate::prompt::ranking_request;
use crate::retry::request_structured;
use inbox_domain::{ClassifiedNote, CompletionService, RankedNote, Scores};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RankingOutput {
    #[serde(default)]
    title: String,
    importance: f64,
    urgency: f64,
    impact: f64,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

fn decode(value: Value) -> Result<RankingOutput, String> {
    serde_json::from_value(value).map_err(|e| format!("bad ranking shape: {}", e))
}

/// Scores classified notes
///
/// Out-of-range scores are clamped into [0, 1], never rejected.
pub struct RankingProcessor<C: ?Sized> {
    service: Arc<C>,
    config: RankingConfig,
    retry: RetryPolicy,
}

impl<C> RankingProcessor<C>
where
    C: CompletionService + ?Sized,
{
    /// Create a new RankingProcessor
    pub fn new(service: Arc<C>, config: RankingConfig, retry: RetryPolicy) -> Self {
        Self {
            service,
            config,
            retry,
        }
    }

    /// Score `classified`
    ///
    /// # Errors
    ///
    /// [`StageError::Ranking`] when the service fails or its output cannot be
    /// decoded after retries. The caller decides what happens to the note.
    pub async fn rank(&self, classified: &ClassifiedNote) -> Result<RankedNote, StageError> {
        let request = ranking_request(classified, self.config.model.clone());
        let output = request_structured(self.service.as_ref(), &request, &self.retry, decode)
            .await
            .map_err(|e| StageError::Ranking(e.to_string()))?;

        let ranked = RankedNote::new(
            classified.clone(),
            output.title,
            Scores::new(output.importance, output.urgency, output.impact),
            output.confidence,
            output.reasoning.trim(),
        );

        info!(
            importance = ranked.scores.importance,
            urgency = ranked.scores.urgency,
            impact = ranked.scores.impact,
            confidence = ranked.confidence,
            "Note ranked"
        );

        Ok(ranked)
    }
}
