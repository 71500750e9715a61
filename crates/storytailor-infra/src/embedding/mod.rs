//! Embedder implementations.
//!
//! [`create_embedder`] picks the backend named in configuration.

pub mod hashing;
pub mod openai;

use secrecy::SecretString;

use storytailor_core::embedding::BoxEmbedder;
use storytailor_types::config::{EmbeddingProvider, EmbeddingSettings};
use storytailor_types::error::GroundingError;

use self::hashing::HashingEmbedder;
use self::openai::OpenAiEmbedder;

/// Build the configured embedder.
///
/// The OpenAI backend needs an API key; the hashing backend ignores it.
pub fn create_embedder(
    settings: &EmbeddingSettings,
    api_key: Option<SecretString>,
) -> Result<BoxEmbedder, GroundingError> {
    match settings.provider {
        EmbeddingProvider::Hashing => Ok(BoxEmbedder::new(HashingEmbedder::new(settings.dimension))),
        EmbeddingProvider::OpenAi => {
            let api_key = api_key.ok_or_else(|| {
                GroundingError::InvalidInput(
                    "the openai embedding provider needs OPENAI_API_KEY".to_string(),
                )
            })?;
            let embedder = OpenAiEmbedder::new(
                api_key,
                &settings.base_url,
                &settings.model,
                settings.dimension,
            )?;
            Ok(BoxEmbedder::new(embedder))
        }
    }
}
