//! Story generator implementations.

pub mod openai_compat;

use secrecy::SecretString;

use storytailor_core::story::{BoxStoryGenerator, StoryGenerator, StoryPrompt};
use storytailor_types::config::GenerationSettings;
use storytailor_types::error::GroundingError;
use storytailor_types::story::StoryConstraints;

use self::openai_compat::OpenAiStoryGenerator;

/// Build the story generator from configuration.
///
/// Without an API key the returned generator fails every call with
/// `GenerationFailed`, so commands that never generate (search, check)
/// still work offline.
pub fn create_story_generator(
    settings: &GenerationSettings,
    api_key: Option<SecretString>,
) -> BoxStoryGenerator {
    match api_key {
        Some(key) => BoxStoryGenerator::new(OpenAiStoryGenerator::new(key, settings)),
        None => BoxStoryGenerator::new(UnconfiguredGenerator),
    }
}

/// Placeholder used when no generation backend is configured.
pub struct UnconfiguredGenerator;

impl StoryGenerator for UnconfiguredGenerator {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn complete(
        &self,
        _prompt: &StoryPrompt,
        _constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        Err(GroundingError::GenerationFailed(
            "no story generator configured; set OPENAI_API_KEY".to_string(),
        ))
    }
}
