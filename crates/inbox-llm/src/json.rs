//! Extracting JSON objects from model text
//!
//! Models asked for JSON still wrap it in prose or Markdown fences. Three
//! strategies are tried in order: the whole text, each fenced code block,
//! then the span from the first `{` to the last `}`.

use crate::LlmError;
use serde_json::Value;

const PREVIEW_CHARS: usize = 120;

/// Pull a JSON object out of a model response
///
/// # Errors
///
/// Returns [`LlmError::MalformedOutput`] when no strategy yields a JSON
/// object.
///
/// # Examples
///
/// ```
/// use inbox_llm::extract_json;
///
/// let text = "Sure! Here you go:\n```json\n{\"project\": \"Home\"}\n```";
/// assert_eq!(extract_json(text).unwrap()["project"], "Home");
/// ```
pub fn extract_json(response: &str) -> Result<Value, LlmError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(LlmError::MalformedOutput("empty response".to_string()));
    }

    if let Some(value) = parse_object(trimmed) {
        return Ok(value);
    }

    for block in fenced_blocks(trimmed) {
        if let Some(value) = parse_object(block) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(value) = parse_object(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(LlmError::MalformedOutput(format!(
        "no JSON object found in response: {}",
        preview(trimmed)
    )))
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Contents of every ``` fenced block, language tag stripped
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        // Skip the info string ("json", "JSON", ...) up to the first newline
        let body_start = match after_fence.find('\n') {
            Some(newline) if !after_fence[..newline].contains('{') => newline + 1,
            _ => 0,
        };
        let body = &after_fence[body_start..];
        match body.find("```") {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + 3..];
            }
            None => break,
        }
    }

    blocks
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
