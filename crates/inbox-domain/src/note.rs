//! Note module - the values produced by each pipeline stage
//!
//! A note moves through four shapes. Each later shape owns the earlier one,
//! so a `RankedNote` still carries its classification and the original text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a task title, in characters
pub const MAX_TITLE_CHARS: usize = 80;

/// Identifier assigned to a note by its capture source
///
/// Opaque to the pipeline; it becomes the task record's `source_note_id`,
/// which is the key a de-duplicating store uses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a note identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A captured note awaiting processing
///
/// Immutable once captured; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNote {
    /// Identifier from the capture source
    pub id: NoteId,

    /// Note body as captured
    pub text: String,

    /// Capture time (seconds since Unix epoch)
    pub captured_at: u64,
}

impl RawNote {
    /// Create a new raw note
    pub fn new(id: impl Into<NoteId>, text: impl Into<String>, captured_at: u64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            captured_at,
        }
    }

    /// True when the note has no visible text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Derive a task title from the note's first non-empty line
    ///
    /// Markdown emphasis, link brackets and leading list bullets are stripped
    /// and the result is capped at [`MAX_TITLE_CHARS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_domain::RawNote;
    ///
    /// let note = RawNote::new("n1", "\n**Fix** the [build]\nmore detail", 0);
    /// assert_eq!(note.default_title(), "Fix the build");
    ///
    /// let empty = RawNote::new("n2", "   ", 0);
    /// assert_eq!(empty.default_title(), "Untitled Task");
    /// ```
    pub fn default_title(&self) -> String {
        let first_line = self
            .text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");

        let stripped: String = first_line
            .chars()
            .filter(|c| !matches!(c, '*' | '[' | ']'))
            .collect();

        let stripped = stripped.trim_start_matches(|c: char| c == '-' || c == '+' || c.is_whitespace());

        let title = truncate_title(stripped.trim());
        if title.is_empty() {
            "Untitled Task".to_string()
        } else {
            title
        }
    }
}

/// Cap a title at [`MAX_TITLE_CHARS`], ending truncated titles with "..."
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let kept: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Clamp a model-reported score into [0, 1]
///
/// NaN collapses to 0 so a garbled score can never pass a threshold.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// What kind of item a note is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Something to do
    Task,
    /// A thought that needs refining
    Idea,
    /// Material to keep or consume later
    Reference,
    /// Noise
    Junk,
}

impl Category {
    /// All categories, in prompt order
    pub const ALL: [Category; 4] = [
        Category::Task,
        Category::Idea,
        Category::Reference,
        Category::Junk,
    ];

    /// Lowercase name used in prompts and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Task => "task",
            Category::Idea => "idea",
            Category::Reference => "reference",
            Category::Junk => "junk",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a category name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Case-insensitive; also accepts the DO_NOW / REFINE / EXECUTE action
    /// vocabulary some prompts and older notes use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "task" | "todo" | "do_now" => Ok(Category::Task),
            "idea" | "refine" => Ok(Category::Idea),
            "reference" | "ref" | "execute" => Ok(Category::Reference),
            "junk" | "noise" => Ok(Category::Junk),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

/// A note routed to a project and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedNote {
    /// The note as captured
    pub note: RawNote,

    /// Project the note belongs to (may be newly discovered)
    pub project: String,

    /// Kind of item
    pub category: Category,

    /// Model's brief rationale for the routing (may be empty)
    pub reasoning: String,

    /// True when `project` was not among the known projects
    pub new_project: bool,
}

impl ClassifiedNote {
    /// Identifier of the underlying note
    pub fn id(&self) -> &NoteId {
        &self.note.id
    }
}

/// Priority axes, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    /// How much the note matters to the user's goals
    pub importance: f64,
    /// How time-sensitive it is
    pub urgency: f64,
    /// Expected effect if acted upon
    pub impact: f64,
}

impl Scores {
    /// Build scores, clamping each axis into [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_domain::Scores;
    ///
    /// let scores = Scores::new(1.4, -0.2, 0.5);
    /// assert_eq!(scores.importance, 1.0);
    /// assert_eq!(scores.urgency, 0.0);
    /// assert_eq!(scores.impact, 0.5);
    /// ```
    pub fn new(importance: f64, urgency: f64, impact: f64) -> Self {
        Self {
            importance: clamp_unit(importance),
            urgency: clamp_unit(urgency),
            impact: clamp_unit(impact),
        }
    }
}

/// A classified note with priority scores and the model's confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNote {
    /// Classification this ranking builds on
    pub classified: ClassifiedNote,

    /// Concise task title
    pub title: String,

    /// Importance, urgency and impact
    pub scores: Scores,

    /// Model's certainty in its classification and ranking, in [0, 1]
    ///
    /// Not a priority signal; see `scores` for that.
    pub confidence: f64,

    /// Model's brief rationale for the scores (may be empty)
    pub reasoning: String,

    /// Set when ranking failed and the note waits for manual review
    pub needs_review: bool,
}

impl RankedNote {
    /// Create a ranked note
    ///
    /// Confidence is clamped into [0, 1]; a blank title falls back to the
    /// note's default title.
    pub fn new(
        classified: ClassifiedNote,
        title: impl Into<String>,
        scores: Scores,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            classified.note.default_title()
        } else {
            truncate_title(title.trim())
        };

        Self {
            classified,
            title,
            scores,
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
            needs_review: false,
        }
    }

    /// Park a note whose ranking failed in the manual-review queue
    ///
    /// All scores and the confidence are zero so it can never pass a gate.
    pub fn for_review(classified: ClassifiedNote) -> Self {
        let title = classified.note.default_title();
        Self {
            classified,
            title,
            scores: Scores::default(),
            confidence: 0.0,
            reasoning: String::new(),
            needs_review: true,
        }
    }

    /// Identifier of the underlying note
    pub fn id(&self) -> &NoteId {
        self.classified.id()
    }

    /// Project the note was routed to
    pub fn project(&self) -> &str {
        &self.classified.project
    }
}

/// A ranked note with the deeper analysis from enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedNote {
    /// Ranking this enrichment builds on
    pub ranked: RankedNote,

    /// Expanded description (never empty)
    pub summary: String,

    /// Ordered suggested next actions
    pub suggested_actions: Vec<String>,

    /// Ordered subtasks
    pub subtasks: Vec<String>,

    /// Analytical lenses the model applied
    pub lenses: Vec<String>,
}

impl EnrichedNote {
    /// Identifier of the underlying note
    pub fn id(&self) -> &NoteId {
        self.ranked.id()
    }
}
