//! StoryGenerator trait definition.

use storytailor_types::error::GroundingError;
use storytailor_types::story::StoryConstraints;

use super::prompt::StoryPrompt;

/// Trait for text-generation backends that write the story.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in storytailor-infra (e.g., `OpenAiStoryGenerator`).
pub trait StoryGenerator: Send + Sync {
    /// Human-readable backend name (e.g., "openai").
    fn name(&self) -> &str;

    /// Produce story text for `prompt`.
    ///
    /// `constraints` carries the structured request fields for backends that
    /// use them beyond the prompt text. Failures are `GenerationFailed`.
    fn complete(
        &self,
        prompt: &StoryPrompt,
        constraints: &StoryConstraints,
    ) -> impl std::future::Future<Output = Result<String, GroundingError>> + Send;
}
