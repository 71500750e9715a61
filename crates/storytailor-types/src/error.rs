use thiserror::Error;

use crate::document::DocumentId;

/// Errors from grounding operations: ingestion, retrieval, fact checking,
/// and grounded story generation.
#[derive(Debug, Error)]
pub enum GroundingError {
    /// Empty or malformed input. The caller must fix it; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Text longer than the embedding gateway accepts. Never truncated.
    #[error("input too long: {len} characters (max {max})")]
    InputTooLong { len: usize, max: usize },

    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    /// Embedding length differs from the knowledge base dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("duplicate document id '{0}'")]
    DuplicateId(DocumentId),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("request cancelled")]
    Cancelled,
}

impl GroundingError {
    /// External-dependency failures a caller may retry under its own policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GroundingError::EmbeddingUnavailable(_)
                | GroundingError::GenerationFailed(_)
                | GroundingError::Timeout { .. }
        )
    }

    /// Retrieval failures that a story request absorbs by generating
    /// without grounding.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            GroundingError::EmbeddingUnavailable(_) | GroundingError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_too_long_display() {
        let err = GroundingError::InputTooLong { len: 3000, max: 2000 };
        assert_eq!(err.to_string(), "input too long: 3000 characters (max 2000)");
    }

    #[test]
    fn test_timeout_display() {
        let err = GroundingError::Timeout {
            operation: "embedding".to_string(),
            after_ms: 250,
        };
        assert_eq!(err.to_string(), "embedding timed out after 250ms");
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = GroundingError::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GroundingError::EmbeddingUnavailable("down".into()).is_retryable());
        assert!(GroundingError::GenerationFailed("500".into()).is_retryable());
        assert!(!GroundingError::InvalidInput("empty".into()).is_retryable());
        assert!(
            !GroundingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_generation_failure_is_not_degradable() {
        assert!(!GroundingError::GenerationFailed("boom".into()).is_degradable());
        assert!(GroundingError::EmbeddingUnavailable("down".into()).is_degradable());
    }
}
