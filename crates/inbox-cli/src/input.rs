//! Reading notes from files and stdin.

use crate::error::{CliError, Result};
use inbox_domain::RawNote;
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A note as written in a JSON notes file.
#[derive(Debug, Deserialize)]
struct NoteDefinition {
    #[serde(default)]
    id: Option<String>,
    text: String,
    #[serde(default)]
    captured_at: Option<u64>,
}

/// Read the notes source, with "-" meaning stdin.
pub fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(source)
            .map_err(|e| CliError::InvalidInput(format!("Cannot read {}: {}", source, e)))
    }
}

/// Identifier derived from note content, stable across runs.
///
/// ```
/// use inbox_cli::input::content_id;
///
/// assert_eq!(content_id("Buy milk"), content_id("  Buy milk\n"));
/// assert_ne!(content_id("Buy milk"), content_id("Buy bread"));
/// ```
pub fn content_id(text: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, text.trim().as_bytes()).to_string()
}

/// Parse a notes document.
///
/// A document starting with `[` is a JSON array of `{id?, text,
/// captured_at?}` objects; anything else is plain text with notes separated
/// by blank lines.
pub fn parse_notes(contents: &str) -> Result<Vec<RawNote>> {
    let now = now_secs();
    let notes: Vec<RawNote> = if contents.trim_start().starts_with('[') {
        let definitions: Vec<NoteDefinition> = serde_json::from_str(contents)?;
        definitions
            .into_iter()
            .map(|def| {
                let id = def.id.unwrap_or_else(|| content_id(&def.text));
                RawNote::new(id, def.text, def.captured_at.unwrap_or(now))
            })
            .collect()
    } else {
        split_paragraphs(contents)
            .into_iter()
            .map(|text| RawNote::new(content_id(&text), text, now))
            .collect()
    };

    if notes.is_empty() {
        return Err(CliError::InvalidInput("No notes provided".to_string()));
    }
    Ok(notes)
}

fn split_paragraphs(contents: &str) -> Vec<String> {
    let mut notes = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                notes.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        notes.push(current.join("\n"));
    }
    notes
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
