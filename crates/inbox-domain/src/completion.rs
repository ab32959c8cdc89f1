//! Completion requests and responses
//!
//! A request is a prompt plus an optional description of the structured
//! output the caller expects. How a backend honours the schema (native JSON
//! mode, free text parsed afterwards, ...) is the adapter's business.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Type of a single output field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Free text
    String,
    /// Floating point number
    Number,
    /// Ordered list of strings
    StringList,
    /// One of a fixed set of strings
    OneOf(Vec<String>),
}

/// One field of an expected output object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it must appear in the output
    pub name: String,
    /// Field type
    pub kind: FieldKind,
    /// Short description shown to the model
    pub description: String,
}

/// Description of the structured output a caller expects
///
/// # Examples
///
/// ```
/// use inbox_domain::{FieldKind, OutputSchema};
///
/// let schema = OutputSchema::new("ranking")
///     .field("importance", FieldKind::Number, "0.0-1.0")
///     .field("title", FieldKind::String, "short task title");
///
/// let json = schema.to_json_schema();
/// assert_eq!(json["properties"]["importance"]["type"], "number");
/// assert_eq!(json["required"][1], "title");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Schema name (stable; adapters and test doubles key on it)
    pub name: String,
    /// Required fields, in prompt order
    pub fields: Vec<FieldSpec>,
}

impl OutputSchema {
    /// Start an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a required field
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        description: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            description: description.into(),
        });
        self
    }

    /// Render as a JSON Schema object
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = match &field.kind {
                FieldKind::String => json!({ "type": "string" }),
                FieldKind::Number => json!({ "type": "number" }),
                FieldKind::StringList => json!({ "type": "array", "items": { "type": "string" } }),
                FieldKind::OneOf(options) => json!({ "type": "string", "enum": options }),
            };
            property["description"] = Value::String(field.description.clone());
            properties.insert(field.name.clone(), property);
        }

        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Render a one-line-per-field JSON template for embedding in prompts
    pub fn describe(&self) -> String {
        let mut out = String::from("{\n");
        for (idx, field) in self.fields.iter().enumerate() {
            let placeholder = match &field.kind {
                FieldKind::String => format!("\"<{}>\"", field.description),
                FieldKind::Number => format!("<number: {}>", field.description),
                FieldKind::StringList => format!("[\"<{}>\"]", field.description),
                FieldKind::OneOf(options) => format!("\"{}\"", options.join("|")),
            };
            let comma = if idx + 1 < self.fields.len() { "," } else { "" };
            out.push_str(&format!("  \"{}\": {}{}\n", field.name, placeholder, comma));
        }
        out.push('}');
        out
    }
}

/// A request to the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instructions (adapters may fold these into the prompt)
    pub system: Option<String>,

    /// User prompt
    pub prompt: String,

    /// Expected structured output; `None` asks for free text
    pub schema: Option<OutputSchema>,

    /// Model override; `None` uses the adapter's default model
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Free-text request with the adapter's default model
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            schema: None,
            model: None,
        }
    }

    /// Attach system instructions
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Ask for structured output matching `schema`
    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Select a model; `None` keeps the adapter default
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Name of the requested schema, if any
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.name.as_str())
    }
}

/// Output of the completion service
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Parsed structured output (requests with a schema)
    Structured(Value),
    /// Raw text (requests without a schema)
    Text(String),
}

impl Completion {
    /// Take the structured payload, if this is structured output
    pub fn into_structured(self) -> Option<Value> {
        match self {
            Completion::Structured(value) => Some(value),
            Completion::Text(_) => None,
        }
    }

    /// Borrow the raw text, if this is a text completion
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Completion::Text(text) => Some(text),
            Completion::Structured(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> OutputSchema {
        OutputSchema::new("classification")
            .field("project", FieldKind::String, "project name")
            .field(
                "category",
                FieldKind::OneOf(vec!["task".into(), "idea".into()]),
                "kind of item",
            )
            .field("tags", FieldKind::StringList, "tag")
    }

    #[test]
    fn test_json_schema_shape() {
        let schema = sample_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["category"]["enum"][1], "idea");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "string");
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_describe_lists_every_field() {
        let text = sample_schema().describe();
        assert!(text.contains("\"project\": \"<project name>\","));
        assert!(text.contains("\"category\": \"task|idea\","));
        assert!(text.contains("\"tags\": [\"<tag>\"]\n"));
        assert!(text.starts_with('{') && text.ends_with('}'));
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("hello")
            .with_system("be brief")
            .with_schema(sample_schema())
            .with_model(Some("gemma".into()));
        assert_eq!(request.schema_name(), Some("classification"));
        assert_eq!(request.model.as_deref(), Some("gemma"));
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_completion_accessors() {
        let structured = Completion::Structured(json!({"a": 1}));
        assert!(structured.as_text().is_none());
        assert_eq!(structured.into_structured().unwrap()["a"], 1);

        let text = Completion::Text("hi".into());
        assert_eq!(text.as_text(), Some("hi"));
        assert!(text.into_structured().is_none());
    }
}
