//! Embedding gateway: the single entry point the core uses to embed text.
//!
//! Wraps a [`BoxEmbedder`] with the three guarantees every caller relies on:
//! input is non-empty and within the accepted length (never truncated), the
//! call finishes within the configured timeout, and the returned vector has
//! the embedder's advertised dimension.

use std::time::Duration;

use storytailor_types::error::GroundingError;

use super::box_embedder::BoxEmbedder;

pub struct EmbeddingGateway {
    embedder: BoxEmbedder,
    timeout: Duration,
    max_input_chars: usize,
}

impl EmbeddingGateway {
    pub fn new(embedder: BoxEmbedder, timeout: Duration, max_input_chars: usize) -> Self {
        Self {
            embedder,
            timeout,
            max_input_chars,
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Validate text before it is sent to the embedder.
    ///
    /// Blank text fails with `InvalidInput`; text longer than
    /// `max_input_chars` characters fails with `InputTooLong`.
    pub fn check_input(&self, text: &str) -> Result<(), GroundingError> {
        if text.trim().is_empty() {
            return Err(GroundingError::InvalidInput(
                "text to embed must not be empty".to_string(),
            ));
        }
        let len = text.chars().count();
        if len > self.max_input_chars {
            return Err(GroundingError::InputTooLong {
                len,
                max: self.max_input_chars,
            });
        }
        Ok(())
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, GroundingError> {
        self.check_input(text)?;

        let texts = [text.to_owned()];
        let mut vectors = tokio::time::timeout(self.timeout, self.embedder.embed(&texts))
            .await
            .map_err(|_| GroundingError::Timeout {
                operation: "embedding".to_string(),
                after_ms: self.timeout.as_millis() as u64,
            })??;

        let vector = vectors.pop().ok_or_else(|| {
            GroundingError::EmbeddingUnavailable(format!(
                "{} returned no vector",
                self.embedder.model_name()
            ))
        })?;

        if vector.len() != self.embedder.dimension() {
            return Err(GroundingError::DimensionMismatch {
                expected: self.embedder.dimension(),
                actual: vector.len(),
            });
        }

        tracing::debug!(
            model = self.embedder.model_name(),
            chars = text.chars().count(),
            "embedded text"
        );
        Ok(vector)
    }
}
