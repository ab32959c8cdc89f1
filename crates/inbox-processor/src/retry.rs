//! Structured completion calls with retry

use crate::config::{RetryPolicy, MAX_ATTEMPTS};
use crate::error::CallError;
use inbox_domain::{CompletionRequest, CompletionService, ServiceError};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Run a structured completion and decode it, retrying per `policy`
///
/// Retryable service errors and undecodable output are retried with
/// exponential backoff; anything else fails at once.
pub(crate) async fn request_structured<C, T, F>(
    service: &C,
    request: &CompletionRequest,
    policy: &RetryPolicy,
    mut decode: F,
) -> Result<T, CallError>
where
    C: CompletionService + ?Sized,
    F: FnMut(Value) -> Result<T, String>,
{
    let schema = request.schema_name().unwrap_or("text");
    let max_attempts = policy.max_attempts.clamp(1, MAX_ATTEMPTS);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(schema, attempt, prompt_chars = request.prompt.len(), "Calling completion service");

        let outcome = match timeout(policy.call_timeout(), service.complete(request)).await {
            Err(_) => Err(CallError::Service {
                message: format!("no answer within {}s", policy.call_timeout_secs),
                retryable: true,
            }),
            Ok(Err(e)) => Err(CallError::Service {
                message: e.to_string(),
                retryable: e.is_retryable(),
            }),
            Ok(Ok(completion)) => match completion.into_structured() {
                Some(value) => decode(value).map_err(CallError::Decode),
                None => Err(CallError::Decode(
                    "expected structured output, got free text".to_string(),
                )),
            },
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(schema, attempt, error = %e, ?delay, "Completion failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt > 1 {
                    return Err(match e {
                        CallError::Decode(msg) => {
                            CallError::Decode(format!("{} (after {} attempts)", msg, attempt))
                        }
                        CallError::Service { message, retryable } => CallError::Service {
                            message: format!("{} (after {} attempts)", message, attempt),
                            retryable,
                        },
                    });
                }
                return Err(e);
            }
        }
    }
}
