//! Embedder trait for text-to-vector conversion.
//!
//! Implementations (local feature hashing, OpenAI-compatible HTTP) live in
//! storytailor-infra.

use storytailor_types::error::GroundingError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors.
    ///
    /// Returns one vector per input text, in input order. Unreachable
    /// backends fail with [`GroundingError::EmbeddingUnavailable`].
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, GroundingError>> + Send;

    /// The model name used for embeddings (e.g., "text-embedding-3-small").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
