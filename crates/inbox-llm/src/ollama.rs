//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Async HTTP communication with the `/api/generate` endpoint
//! - Native JSON mode: structured requests send their JSON schema as `format`
//! - Per-request model override
//! - Retry logic with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use inbox_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1")?;
//! # Ok::<(), inbox_llm::LlmError>(())
//! ```

use crate::{completion_from_text, request_error, status_error, with_retries, LlmError};
use async_trait::async_trait;
use inbox_domain::{Completion, CompletionRequest, CompletionService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default number of attempts per request
///
/// The pipeline retries stages itself; adapters default to a single attempt
/// so the two layers do not multiply.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Ollama API provider for local LLM inference
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the default timeout
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Default model (e.g., "llama3.1", "mistral")
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(
            endpoint,
            model,
            Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a new Ollama provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Create a new Ollama provider against `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Default model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate raw text for `request`
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response envelope is invalid
    pub async fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let model = request.model.as_deref().unwrap_or(&self.model);

        let body = OllamaGenerateRequest {
            model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            format: request.schema.as_ref().map(|s| s.to_json_schema()),
            stream: false,
        };

        let (url, body) = (&url, &body);
        with_retries(self.max_retries, || async move {
            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(status_error(status, error_text, model));
            }

            let parsed: OllamaGenerateResponse = response.json().await.map_err(|e| {
                LlmError::Communication(format!("Failed to parse response envelope: {}", e))
            })?;
            Ok(parsed.response)
        })
        .await
    }
}

#[async_trait]
impl CompletionService for OllamaProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        let text = self.generate(request).await?;
        completion_from_text(request, text)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
