//! OpenAI-compatible chat completions provider
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Gemini's OpenAI endpoint, vLLM, LM Studio, ...).
//!
//! Models differ in what they accept. Gemma models other than the "flash"
//! variants reject both `response_format` and the `system` role, so for them
//! the system prompt is folded into the user message and structured output is
//! parsed from free text.

use crate::{completion_from_text, request_error, status_error, with_retries, LlmError};
use async_trait::async_trait;
use inbox_domain::{Completion, CompletionRequest, CompletionService};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Whether `model` accepts `response_format: {"type": "json_object"}`
///
/// # Examples
///
/// ```
/// use inbox_llm::openai::supports_response_format;
///
/// assert!(supports_response_format("gpt-4o-mini"));
/// assert!(supports_response_format("gemma-3n-flash"));
/// assert!(!supports_response_format("gemma-3-27b-it"));
/// ```
pub fn supports_response_format(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    !(model.contains("gemma") && !model.contains("flash"))
}

/// Whether `model` accepts messages with the `system` role
pub fn supports_system_role(model: &str) -> bool {
    supports_response_format(model)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Build the message list for `model`
fn build_messages(request: &CompletionRequest, model: &str) -> Vec<ChatMessage> {
    match &request.system {
        Some(system) if supports_system_role(model) => vec![
            ChatMessage {
                role: "system",
                content: system.clone(),
            },
            ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            },
        ],
        Some(system) => vec![ChatMessage {
            role: "user",
            content: format!("Instructions:\n{}\n\n{}", system, request.prompt),
        }],
        None => vec![ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        }],
    }
}

fn build_body<'a>(
    request: &'a CompletionRequest,
    model: &'a str,
    temperature: Option<f64>,
) -> ChatRequest<'a> {
    let response_format = if request.schema.is_some() && supports_response_format(model) {
        Some(json!({ "type": "json_object" }))
    } else {
        None
    };

    ChatRequest {
        model,
        messages: build_messages(request, model),
        temperature,
        response_format,
    }
}

/// Provider for OpenAI-compatible chat completion APIs
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f64>,
    client: reqwest::Client,
    max_retries: u32,
}

impl OpenAiCompatProvider {
    /// Create a provider
    ///
    /// # Parameters
    ///
    /// - `base_url`: API root, e.g. "https://api.openai.com/v1"
    /// - `api_key`: Bearer token, if the server needs one
    /// - `model`: Default model
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_llm::OpenAiCompatProvider;
    ///
    /// let provider = OpenAiCompatProvider::new(
    ///     "https://generativelanguage.googleapis.com/v1beta/openai",
    ///     Some("key".to_string()),
    ///     "gemini-2.0-flash",
    /// )?;
    /// assert_eq!(provider.model(), "gemini-2.0-flash");
    /// # Ok::<(), inbox_llm::LlmError>(())
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Self::with_timeout(
            base_url,
            api_key,
            model,
            Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a provider with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            temperature: None,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the sampling temperature sent with every request
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
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
    pub async fn generate(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = build_body(request, model, self.temperature);

        let (url, body) = (&url, &body);
        with_retries(self.max_retries, || async move {
            let mut builder = self.client.post(url).json(body);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            let response = builder.send().await.map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(status_error(status, error_text, model));
            }

            let parsed: ChatResponse = response.json().await.map_err(|e| {
                LlmError::Communication(format!("Failed to parse response envelope: {}", e))
            })?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| LlmError::MalformedOutput("response contained no choices".into()))
        })
        .await
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        let text = self.generate(request).await?;
        completion_from_text(request, text)
    }

    fn name(&self) -> &str {
        "openai-compat"
    }
}
