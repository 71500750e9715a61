//! BoxStoryGenerator -- object-safe wrapper for StoryGenerator.
//!
//! Same shape as `BoxEmbedder`: a dyn-safe trait with boxed futures, a
//! blanket impl over every `StoryGenerator`, and a wrapper that delegates.

use std::future::Future;
use std::pin::Pin;

use storytailor_types::error::GroundingError;
use storytailor_types::story::StoryConstraints;

use super::generator::StoryGenerator;
use super::prompt::StoryPrompt;

pub trait StoryGeneratorDyn: Send + Sync {
    fn name_dyn(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        prompt: &'a StoryPrompt,
        constraints: &'a StoryConstraints,
    ) -> Pin<Box<dyn Future<Output = Result<String, GroundingError>> + Send + 'a>>;
}

impl<T: StoryGenerator> StoryGeneratorDyn for T {
    fn name_dyn(&self) -> &str {
        self.name()
    }

    fn complete_boxed<'a>(
        &'a self,
        prompt: &'a StoryPrompt,
        constraints: &'a StoryConstraints,
    ) -> Pin<Box<dyn Future<Output = Result<String, GroundingError>> + Send + 'a>> {
        Box::pin(self.complete(prompt, constraints))
    }
}

/// Type-erased story generator selected at runtime from configuration.
pub struct BoxStoryGenerator {
    inner: Box<dyn StoryGeneratorDyn + Send + Sync>,
}

impl BoxStoryGenerator {
    pub fn new<T: StoryGenerator + 'static>(generator: T) -> Self {
        Self {
            inner: Box::new(generator),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name_dyn()
    }

    pub async fn complete(
        &self,
        prompt: &StoryPrompt,
        constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        self.inner.complete_boxed(prompt, constraints).await
    }
}
