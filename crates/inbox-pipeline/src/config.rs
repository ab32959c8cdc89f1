//! Configuration for a pipeline run
//!
//! Read once at startup and passed down immutably.

use crate::error::PipelineError;
use inbox_gatekeeper::ThresholdConfig;
use inbox_processor::{EnrichmentConfig, MetadataConfig, RankingConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Batch-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Projects the registry is seeded with
    pub known_projects: Vec<String>,

    /// Maximum notes in flight at once
    pub concurrency: usize,

    /// Tasks ranked with confidence below this are stored as ambiguous
    pub ambiguity_threshold: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            known_projects: Vec::new(),
            concurrency: 4,
            ambiguity_threshold: 0.9,
        }
    }
}

/// Full configuration of the inbox pipeline
///
/// Every section is optional in TOML; missing values take their defaults.
///
/// # Examples
///
/// ```
/// use inbox_pipeline::InboxConfig;
///
/// let config = InboxConfig::from_toml(r#"
///     [gate]
///     threshold = 0.6
///
///     [pipeline]
///     known_projects = ["Home", "Work"]
/// "#).unwrap();
///
/// assert_eq!(config.gate.threshold, 0.6);
/// assert_eq!(config.gate.min_confidence, 0.5);
/// assert_eq!(config.pipeline.known_projects.len(), 2);
/// assert_eq!(config.pipeline.concurrency, 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Enrichment gate thresholds and weights
    pub gate: ThresholdConfig,

    /// Classification settings
    pub metadata: MetadataConfig,

    /// Ranking settings
    pub ranking: RankingConfig,

    /// Enrichment settings
    pub enrichment: EnrichmentConfig,

    /// Retry policy for completion calls
    pub retry: RetryPolicy,

    /// Batch settings
    pub pipeline: PipelineSettings,
}

impl InboxConfig {
    /// Enrich almost everything
    pub fn permissive() -> Self {
        Self {
            gate: ThresholdConfig::permissive(),
            pipeline: PipelineSettings {
                ambiguity_threshold: 0.7,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Enrich only clearly urgent, important work
    pub fn strict() -> Self {
        Self {
            gate: ThresholdConfig::strict(),
            pipeline: PipelineSettings {
                ambiguity_threshold: 0.95,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, PipelineError> {
        let config: Self = toml::from_str(text).map_err(|e| PipelineError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Serialize(e.to_string()))
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.gate.validate()?;

        let section = |name: &str, result: Result<(), String>| {
            result.map_err(|e| PipelineError::Config(format!("{}: {}", name, e)))
        };
        section("metadata", self.metadata.validate())?;
        section("enrichment", self.enrichment.validate())?;
        section("retry", self.retry.validate())?;

        if self.pipeline.concurrency == 0 {
            return Err(PipelineError::Config(
                "pipeline: concurrency must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pipeline.ambiguity_threshold) {
            return Err(PipelineError::Config(format!(
                "pipeline: ambiguity_threshold must be in [0, 1], got {}",
                self.pipeline.ambiguity_threshold
            )));
        }
        if self
            .pipeline
            .known_projects
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(PipelineError::Config(
                "pipeline: known_projects must not contain blank names".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InboxConfig::default();
        assert_eq!(config.gate.threshold, 0.5);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.pipeline.ambiguity_threshold, 0.9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(InboxConfig::permissive().validate().is_ok());
        assert!(InboxConfig::strict().validate().is_ok());
        assert!(InboxConfig::strict().gate.threshold > InboxConfig::permissive().gate.threshold);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = InboxConfig::strict();
        config.pipeline.known_projects = vec!["Home".to_string()];
        config.ranking.model = Some("llama3.2".to_string());

        let text = config.to_toml().unwrap();
        assert!(text.contains("[gate]"));
        assert_eq!(InboxConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(InboxConfig::from_toml("").unwrap(), InboxConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = InboxConfig::default();
        config.pipeline.concurrency = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let mut config = InboxConfig::default();
        config.gate.threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gate"));

        let mut config = InboxConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().unwrap_err().to_string().contains("retry"));

        let mut config = InboxConfig::default();
        config.pipeline.known_projects = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            InboxConfig::from_toml("[gate]\nthreshold = \"high\""),
            Err(PipelineError::Parse(_))
        ));
    }
}
