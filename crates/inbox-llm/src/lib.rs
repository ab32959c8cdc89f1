//! Inbox Agent LLM Provider Layer
//!
//! Pluggable implementations of the `CompletionService` trait from
//! `inbox-domain`.
//!
//! # Architecture
//!
//! Every provider honours the same contract: a request with a schema comes
//! back as parsed JSON or fails with [`LlmError::MalformedOutput`]. Whether the
//! backend has a native JSON mode or needs its free text parsed is handled
//! here and never reaches the pipeline stages.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scripted mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiCompatProvider`: Any OpenAI-compatible chat completions endpoint
//!
//! # Examples
//!
//! ```
//! use inbox_llm::MockProvider;
//! use inbox_domain::{CompletionRequest, CompletionService};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.complete(&CompletionRequest::new("test prompt")).await.unwrap();
//! assert_eq!(result.as_text(), Some("Hello from LLM!"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod json;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use inbox_domain::{Completion, CompletionRequest, CompletionService, ServiceError};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use json::extract_json;
pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatProvider;

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The backend did not answer in time
    #[error("Request timed out")]
    Timeout,

    /// Output could not be parsed into the expected structure
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    /// Quota or rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfiguration (bad endpoint, rejected credentials, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl ServiceError for LlmError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout
                | LlmError::MalformedOutput(_)
                | LlmError::RateLimitExceeded
        )
    }
}

/// Map a transport failure to an [`LlmError`]
pub(crate) fn request_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

/// Map a non-success HTTP status to an [`LlmError`]
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::Configuration(format!("credentials rejected (HTTP {})", status)),
        404 => LlmError::ModelNotAvailable(model.to_string()),
        408 | 504 => LlmError::Timeout,
        429 => LlmError::RateLimitExceeded,
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Backoff before retry `attempt` (1-based): 1s, 2s, 4s, ...
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt.saturating_sub(1)))
}

/// Run `attempt_fn` up to `max_attempts` times, backing off between retryable
/// failures
pub(crate) async fn with_retries<T, F, Fut>(max_attempts: u32, mut attempt_fn: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                let delay = backoff_delay(attempts);
                tracing::warn!(attempt = attempts, error = %e, ?delay, "LLM request failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Turn raw model text into a completion for `request`
///
/// Structured requests are parsed with [`extract_json`]; free-text requests
/// pass through untouched.
pub(crate) fn completion_from_text(
    request: &CompletionRequest,
    text: String,
) -> Result<Completion, LlmError> {
    if request.schema.is_some() {
        extract_json(&text).map(Completion::Structured)
    } else {
        Ok(Completion::Text(text))
    }
}

/// A scripted reply for [`MockProvider`]
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Already-structured output
    Json(Value),
    /// Raw model text (parsed like a real provider would for structured requests)
    Text(String),
    /// A failure
    Error(LlmError),
}

impl From<Value> for MockReply {
    fn from(value: Value) -> Self {
        MockReply::Json(value)
    }
}

impl From<&str> for MockReply {
    fn from(text: &str) -> Self {
        MockReply::Text(text.to_string())
    }
}

impl From<LlmError> for MockReply {
    fn from(error: LlmError) -> Self {
        MockReply::Error(error)
    }
}

#[derive(Debug)]
struct MockRule {
    schema: String,
    needle: String,
    replies: VecDeque<MockReply>,
}

impl MockRule {
    fn matches(&self, request: &CompletionRequest) -> bool {
        let schema_ok = self.schema == "*" || request.schema_name() == Some(self.schema.as_str());
        schema_ok && request.prompt.contains(&self.needle)
    }

    /// Pop the next reply; the last one repeats forever
    fn next_reply(&mut self) -> MockReply {
        if self.replies.len() > 1 {
            self.replies.pop_front().unwrap_or(MockReply::Text(String::new()))
        } else {
            self.replies
                .front()
                .cloned()
                .unwrap_or(MockReply::Text(String::new()))
        }
    }
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured replies without making any network
/// calls. Replies are keyed by schema name plus a substring of the prompt, so
/// a test can script each stage for each note independently. Several replies
/// for the same key are served in order, and the last one repeats.
///
/// # Examples
///
/// ```
/// use inbox_llm::{LlmError, MockProvider};
/// use inbox_domain::{CompletionRequest, CompletionService, FieldKind, OutputSchema};
/// use serde_json::json;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let provider = MockProvider::default();
/// provider.add_reply("ranking", "Buy milk", "not json");
/// provider.add_reply("ranking", "Buy milk", json!({"importance": 0.1}));
///
/// let schema = OutputSchema::new("ranking").field("importance", FieldKind::Number, "0-1");
/// let request = CompletionRequest::new("Rank: Buy milk").with_schema(schema);
///
/// // First call gets the malformed text, later calls get the JSON
/// assert!(matches!(provider.complete(&request).await, Err(LlmError::MalformedOutput(_))));
/// assert!(provider.complete(&request).await.is_ok());
/// assert_eq!(provider.calls_for("ranking"), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: MockReply,
    rules: Arc<Mutex<Vec<MockRule>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed text reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Text(response.into()),
            rules: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply for requests with schema `schema` whose prompt contains
    /// `needle`
    ///
    /// Use `"*"` as the schema to match any request and `""` as the needle to
    /// match any prompt.
    pub fn add_reply(&self, schema: &str, needle: &str, reply: impl Into<MockReply>) {
        let reply = reply.into();
        let mut rules = self.lock_rules();
        if let Some(rule) = rules
            .iter_mut()
            .find(|r| r.schema == schema && r.needle == needle)
        {
            rule.replies.push_back(reply);
            return;
        }
        rules.push(MockRule {
            schema: schema.to_string(),
            needle: needle.to_string(),
            replies: VecDeque::from([reply]),
        });
    }

    /// Configure an error for matching requests
    pub fn add_error(&self, schema: &str, needle: &str, error: LlmError) {
        self.add_reply(schema, needle, MockReply::Error(error));
    }

    /// Get the number of times `complete` was called
    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Number of calls that requested schema `schema`
    pub fn calls_for(&self, schema: &str) -> usize {
        self.lock_requests()
            .iter()
            .filter(|r| r.schema_name() == Some(schema))
            .count()
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock_requests().clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.lock_requests().clear();
    }

    fn lock_rules(&self) -> std::sync::MutexGuard<'_, Vec<MockRule>> {
        self.rules.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<CompletionRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_for(&self, request: &CompletionRequest) -> MockReply {
        let mut rules = self.lock_rules();
        match rules.iter_mut().find(|rule| rule.matches(request)) {
            Some(rule) => rule.next_reply(),
            None => self.default_reply.clone(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionService for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        self.lock_requests().push(request.clone());

        match self.reply_for(request) {
            MockReply::Json(value) => {
                if request.schema.is_some() {
                    Ok(Completion::Structured(value))
                } else {
                    Ok(Completion::Text(value.to_string()))
                }
            }
            MockReply::Text(text) => completion_from_text(request, text),
            MockReply::Error(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_domain::{FieldKind, OutputSchema};
    use serde_json::json;

    fn structured(prompt: &str, schema: &str) -> CompletionRequest {
        CompletionRequest::new(prompt)
            .with_schema(OutputSchema::new(schema).field("a", FieldKind::Number, "a"))
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&CompletionRequest::new("any prompt")).await;
        assert_eq!(result.unwrap().as_text(), Some("Test response"));
    }

    #[tokio::test]
    async fn test_mock_provider_default_is_parsed_for_schema() {
        let provider = MockProvider::new(r#"{"a": 1}"#);
        let result = provider.complete(&structured("x", "s")).await.unwrap();
        assert_eq!(result.into_structured().unwrap()["a"], 1);
    }

    #[tokio::test]
    async fn test_mock_provider_specific_replies() {
        let provider = MockProvider::default();
        provider.add_reply("ranking", "hello", json!({"a": 1}));
        provider.add_reply("enrichment", "hello", json!({"a": 2}));

        let ranking = provider.complete(&structured("say hello", "ranking")).await;
        let enrichment = provider.complete(&structured("say hello", "enrichment")).await;
        assert_eq!(ranking.unwrap().into_structured().unwrap()["a"], 1);
        assert_eq!(enrichment.unwrap().into_structured().unwrap()["a"], 2);
    }

    #[tokio::test]
    async fn test_mock_provider_sequence_repeats_last() {
        let provider = MockProvider::default();
        provider.add_reply("s", "", "garbage");
        provider.add_reply("s", "", json!({"a": 3}));

        let request = structured("p", "s");
        assert!(provider.complete(&request).await.is_err());
        assert!(provider.complete(&request).await.is_ok());
        assert!(provider.complete(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.complete(&CompletionRequest::new("prompt1")).await.unwrap();
        provider.complete(&structured("{}", "ranking")).await.ok();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls_for("ranking"), 1);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.add_error("*", "bad prompt", LlmError::RateLimitExceeded);

        let result = provider.complete(&CompletionRequest::new("bad prompt")).await;
        assert_eq!(result.unwrap_err(), LlmError::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&CompletionRequest::new("test")).await.unwrap();

        // Both should share the same call log due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::MalformedOutput("x".into()).is_retryable());
        assert!(LlmError::RateLimitExceeded.is_retryable());
        assert!(LlmError::Communication("x".into()).is_retryable());
        assert!(!LlmError::ModelNotAvailable("m".into()).is_retryable());
        assert!(!LlmError::Configuration("c".into()).is_retryable());
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_status_error_mapping() {
        use reqwest::StatusCode;
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new(), "m"),
            LlmError::RateLimitExceeded
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, String::new(), "m"),
            LlmError::ModelNotAvailable("m".into())
        );
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into(), "m"),
            LlmError::Communication(_)
        ));
    }
}
