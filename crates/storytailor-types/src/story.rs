//! Story generation request/result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GroundingError;
use crate::verification::ClaimVerdict;

/// Youngest supported reader age.
pub const MIN_AGE: u8 = 3;
/// Oldest supported reader age.
pub const MAX_AGE: u8 = 15;

/// Retrieval query used when a request names no preferences.
pub const DEFAULT_STORY_QUERY: &str = "fun adventure";

/// A request for a children's story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    /// Reader age in years (3-15).
    pub age: u8,
    /// Lexile reading level, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_level: Option<u32>,
    /// Preferred topics (e.g., "rabbit", "friendship").
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_goal: Option<String>,
    /// Whether to ground the story in the knowledge base.
    #[serde(default = "default_use_grounding")]
    pub use_grounding: bool,
}

fn default_use_grounding() -> bool {
    true
}

impl StoryRequest {
    pub fn new(age: u8) -> Self {
        Self {
            age,
            reading_level: None,
            preferences: Vec::new(),
            learning_goal: None,
            use_grounding: true,
        }
    }

    pub fn with_preferences<I, S>(mut self, preferences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences = preferences.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_learning_goal(mut self, goal: impl Into<String>) -> Self {
        self.learning_goal = Some(goal.into());
        self
    }

    pub fn ungrounded(mut self) -> Self {
        self.use_grounding = false;
        self
    }

    /// Reject ages outside the supported range.
    pub fn validate(&self) -> Result<(), GroundingError> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(GroundingError::InvalidInput(format!(
                "age must be between {MIN_AGE} and {MAX_AGE}, got {}",
                self.age
            )));
        }
        Ok(())
    }

    /// Preferences with surrounding whitespace removed and blanks dropped.
    pub fn topics(&self) -> Vec<String> {
        self.preferences
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Retrieval query synthesized from the topics and the learning goal.
    pub fn retrieval_query(&self) -> String {
        let mut parts = self.topics();
        if let Some(goal) = self.learning_goal.as_deref().map(str::trim) {
            if !goal.is_empty() {
                parts.push(goal.to_owned());
            }
        }
        if parts.is_empty() {
            DEFAULT_STORY_QUERY.to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn constraints(&self) -> StoryConstraints {
        StoryConstraints {
            age: self.age,
            reading_level: self.reading_level,
            preferences: self.topics(),
            learning_goal: self.learning_goal.clone(),
        }
    }
}

/// Constraints forwarded to the generation collaborator alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryConstraints {
    pub age: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_level: Option<u32>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_goal: Option<String>,
}

/// Result of one grounded story generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedStoryResult {
    pub story_text: String,
    /// Source labels that went into the prompt, deduplicated, first-seen order.
    pub sources: Vec<String>,
    /// Whether the generated text was checked against the knowledge base.
    pub fact_checked: bool,
    /// Weakest-claim confidence in [0, 1]; 0.0 when not fact checked.
    pub confidence_score: f64,
    /// Short previews of the retrieved documents.
    #[serde(default)]
    pub rag_context: Vec<String>,
    /// Per-claim verdicts behind `confidence_score`.
    #[serde(default)]
    pub claims: Vec<ClaimVerdict>,
}

/// States of a grounded generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Retrieving,
    Generating,
    Verifying,
    Done,
    Failed,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Done | GenerationState::Failed)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationState::Retrieving => write!(f, "retrieving"),
            GenerationState::Generating => write!(f, "generating"),
            GenerationState::Verifying => write!(f, "verifying"),
            GenerationState::Done => write!(f, "done"),
            GenerationState::Failed => write!(f, "failed"),
        }
    }
}
