//! LLM prompt engineering for the three model-backed stages
//!
//! Each builder returns a complete [`CompletionRequest`]: system
//! instructions, the user prompt with the expected JSON template spelled out,
//! and the output schema. Schema names are stable; test doubles key on them.

use inbox_domain::{
    Category, ClassifiedNote, CompletionRequest, FieldKind, OutputSchema, RankedNote, RawNote,
};

/// Schema name of classification requests
pub const CLASSIFICATION_SCHEMA: &str = "classification";

/// Schema name of ranking requests
pub const RANKING_SCHEMA: &str = "ranking";

/// Schema name of enrichment requests
pub const ENRICHMENT_SCHEMA: &str = "enrichment";

/// The four analytical lenses offered to the enrichment model
pub const LENSES: [(&str, &str); 4] = [
    (
        "First Principles",
        "Strip the idea down to its fundamental truths. What are the physics, not the opinions?",
    ),
    (
        "Inversion",
        "Pre-mortem: assume this failed. Why did it fail?",
    ),
    (
        "80/20",
        "Which single sub-task delivers 80% of the value? Drop the rest.",
    ),
    (
        "Devil's Advocate",
        "Give one brutal reason why this is a waste of time.",
    ),
];

const CLASSIFICATION_SYSTEM: &str = "You are an inbox triage assistant. You route captured notes to \
projects and decide what kind of item each note is. Answer with JSON only.";

const RANKING_SYSTEM: &str = "You are a priority assessment expert. You score notes soberly and \
default to low scores unless the note gives strong evidence otherwise. Answer with JSON only.";

const ENRICHMENT_SYSTEM: &str = "You are an analytical thinking engine. You turn important notes \
into actionable plans. No filler words. Answer with JSON only.";

const CATEGORY_DEFINITIONS: &str = r#"task: a concrete action with a clear deliverable and binary completion ("Fix bug", "Call the bank")
idea: an insight, plan or habit that needs more thinking before it becomes work
reference: material to keep for later consumption (articles, videos, links)
junk: noise with no lasting value"#;

const RANKING_SCALES: &str = r#"- importance (0.0-1.0): how critical this is to the user's goals. 0.25 = moderate, 0.75 = important, 1.0 = critical
- urgency (0.0-1.0): how time-sensitive it is, independent of importance. 0.0 = no deadline, 0.5 = this week, 1.0 = today
- impact (0.0-1.0): estimated contribution to goals if acted upon. Most notes score 0.1-0.3
- confidence (0.0-1.0): how certain you are of this classification and these scores. This is NOT the priority"#;

/// Output schema for classification
pub fn classification_schema() -> OutputSchema {
    let categories = Category::ALL.iter().map(|c| c.as_str().to_string()).collect();
    OutputSchema::new(CLASSIFICATION_SCHEMA)
        .field("project", FieldKind::String, "project name")
        .field("category", FieldKind::OneOf(categories), "kind of item")
        .field("reasoning", FieldKind::String, "one sentence explaining the routing")
}

/// Output schema for ranking
pub fn ranking_schema() -> OutputSchema {
    OutputSchema::new(RANKING_SCHEMA)
        .field("title", FieldKind::String, "short task title, max 80 chars")
        .field("importance", FieldKind::Number, "0.0-1.0")
        .field("urgency", FieldKind::Number, "0.0-1.0")
        .field("impact", FieldKind::Number, "0.0-1.0")
        .field("confidence", FieldKind::Number, "0.0-1.0")
        .field("reasoning", FieldKind::String, "one or two sentences")
}

/// Output schema for enrichment
pub fn enrichment_schema() -> OutputSchema {
    OutputSchema::new(ENRICHMENT_SCHEMA)
        .field("summary", FieldKind::String, "bottom-line-up-front description of the task")
        .field("subtasks", FieldKind::StringList, "ordered subtask")
        .field("suggested_actions", FieldKind::StringList, "next action")
        .field("lenses", FieldKind::StringList, "name of a lens you applied")
}

fn render_note(prompt: &mut String, text: &str) {
    prompt.push_str("<note>\n");
    prompt.push_str(text.trim());
    prompt.push_str("\n</note>\n\n");
}

fn render_output(prompt: &mut String, schema: &OutputSchema) {
    prompt.push_str("Return ONLY valid JSON, no markdown code blocks, no explanations:\n");
    prompt.push_str(&schema.describe());
}

/// Build the classification request
pub fn classification_request(
    note: &RawNote,
    known_projects: &[String],
    model: Option<String>,
) -> CompletionRequest {
    let mut prompt = String::new();

    prompt.push_str("<projects>\n");
    if known_projects.is_empty() {
        prompt.push_str("(none yet)\n");
    }
    for project in known_projects {
        prompt.push_str(&format!("- {}\n", project));
    }
    prompt.push_str("</projects>\n\n");

    prompt.push_str("<categories>\n");
    prompt.push_str(CATEGORY_DEFINITIONS);
    prompt.push_str("\n</categories>\n\n");

    render_note(&mut prompt, &note.text);

    prompt.push_str(
        "Rules:\n\
         - Use an existing project when the note plausibly belongs to it, spelled exactly as listed\n\
         - Propose a short new project name only when none fits\n\
         - Pick exactly one category\n\n",
    );

    let schema = classification_schema();
    render_output(&mut prompt, &schema);

    CompletionRequest::new(prompt)
        .with_system(CLASSIFICATION_SYSTEM)
        .with_schema(schema)
        .with_model(model)
}

/// Build the ranking request
pub fn ranking_request(classified: &ClassifiedNote, model: Option<String>) -> CompletionRequest {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Project: {}\nCategory: {}\n\n",
        classified.project, classified.category
    ));
    render_note(&mut prompt, &classified.note.text);

    prompt.push_str("Generate a concise title and score the note on these scales:\n");
    prompt.push_str(RANKING_SCALES);
    prompt.push_str("\n\n");

    let schema = ranking_schema();
    render_output(&mut prompt, &schema);

    CompletionRequest::new(prompt)
        .with_system(RANKING_SYSTEM)
        .with_schema(schema)
        .with_model(model)
}

/// Build the enrichment request
pub fn enrichment_request(
    ranked: &RankedNote,
    max_summary_words: usize,
    max_list_items: usize,
    model: Option<String>,
) -> CompletionRequest {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Title: {}\nProject: {}\n\n",
        ranked.title,
        ranked.project()
    ));
    render_note(&mut prompt, &ranked.classified.note.text);

    prompt.push_str("Examine the note through these lenses:\n");
    for (name, question) in LENSES.iter() {
        prompt.push_str(&format!("- {}: {}\n", name, question));
    }
    prompt.push('\n');

    prompt.push_str(&format!(
        "Your task:\n\
         1. Apply all four lenses mentally\n\
         2. Keep only two: the most impactful and the most counter-intuitive\n\
         3. Write the summary bottom line up front, using the two lenses, in at most {} words\n\
         4. List at most {} ordered subtasks and at most {} suggested actions; either may be empty\n\n",
        max_summary_words, max_list_items, max_list_items
    ));

    let schema = enrichment_schema();
    render_output(&mut prompt, &schema);

    CompletionRequest::new(prompt)
        .with_system(ENRICHMENT_SYSTEM)
        .with_schema(schema)
        .with_model(model)
}
