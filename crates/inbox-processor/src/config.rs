//! Configuration for the pipeline stages

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Model override for classification (None = adapter default)
    pub model: Option<String>,

    /// Maximum note length (characters)
    pub max_text_length: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_text_length: 10_000,
        }
    }
}

/// Configuration for ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Model override for ranking (None = adapter default)
    pub model: Option<String>,
}

/// Configuration for enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Model override for enrichment (None = adapter default)
    pub model: Option<String>,

    /// Summary word cap
    pub max_summary_words: usize,

    /// Cap on subtasks and on suggested actions
    pub max_list_items: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_summary_words: 300,
            max_list_items: 7,
        }
    }
}

/// Most attempts a completion call may make: the first plus one retry
pub const MAX_ATTEMPTS: u32 = 2;

/// Retry behaviour for completion calls
///
/// A call is retried at most once. Store calls are never retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per call, including the first (1 or [`MAX_ATTEMPTS`])
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub backoff_ms: u64,

    /// Maximum time for a single completion call (seconds)
    pub call_timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_ms: 500,
            call_timeout_secs: 120,
        }
    }
}

impl RetryPolicy {
    /// Policy with no waiting between attempts (for tests and dry runs)
    pub fn immediate() -> Self {
        Self {
            backoff_ms: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_processor::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy { backoff_ms: 100, ..Default::default() };
    /// assert_eq!(policy.backoff(1), Duration::from_millis(100));
    /// assert_eq!(policy.backoff(3), Duration::from_millis(400));
    /// ```
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    /// Get the call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.max_attempts > MAX_ATTEMPTS {
            return Err(format!(
                "max_attempts must be at most {} (one retry)",
                MAX_ATTEMPTS
            ));
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl MetadataConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl EnrichmentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_summary_words == 0 {
            return Err("max_summary_words must be greater than 0".to_string());
        }
        if self.max_list_items == 0 {
            return Err("max_list_items must be greater than 0".to_string());
        }
        Ok(())
    }
}
