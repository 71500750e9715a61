//! Configuration types for StoryTailor grounding.
//!
//! `GroundingConfig` represents the `config.toml` in the data directory.
//! Every field has a serde default so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

use crate::error::GroundingError;

/// Top-level grounding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingConfig {
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub verification: VerificationSettings,
}

impl GroundingConfig {
    /// Reject settings that would break the confidence or sizing invariants.
    pub fn validate(&self) -> Result<(), GroundingError> {
        let v = &self.verification;
        if !(0.0..1.0).contains(&v.min_relevance) {
            return Err(GroundingError::InvalidInput(format!(
                "verification.min_relevance must be in [0, 1), got {}",
                v.min_relevance
            )));
        }
        if !(0.0..=1.0).contains(&v.verify_threshold) {
            return Err(GroundingError::InvalidInput(format!(
                "verification.verify_threshold must be in [0, 1], got {}",
                v.verify_threshold
            )));
        }
        for (name, value) in [
            ("embedding.dimension", self.embedding.dimension),
            ("embedding.max_input_chars", self.embedding.max_input_chars),
            ("retrieval.n_results", self.retrieval.n_results),
            ("retrieval.max_context_chars", self.retrieval.max_context_chars),
            ("verification.top_n", v.top_n),
            ("verification.max_claims", v.max_claims),
        ] {
            if value == 0 {
                return Err(GroundingError::InvalidInput(format!(
                    "{name} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local feature-hashing embedder; works offline.
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Longest text (in characters) the gateway accepts.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            dimension: default_dimension(),
            max_input_chars: default_max_input_chars(),
            timeout_ms: default_embedding_timeout_ms(),
            model: default_embedding_model(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_generation_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Documents retrieved to ground a story.
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Character budget for the injected context block.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSettings {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Best-match similarity below which a statement has no evidence.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
    /// Confidence at or above which a statement counts as verified.
    #[serde(default = "default_verify_threshold")]
    pub verify_threshold: f64,
    /// Sentences of a generated story that get fact checked.
    #[serde(default = "default_max_claims")]
    pub max_claims: usize,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_relevance: default_min_relevance(),
            verify_threshold: default_verify_threshold(),
            max_claims: default_max_claims(),
        }
    }
}

fn default_dimension() -> usize {
    384
}

fn default_max_input_chars() -> usize {
    2_000
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1_000
}

fn default_generation_timeout_ms() -> u64 {
    60_000
}

fn default_n_results() -> usize {
    3
}

fn default_max_context_chars() -> usize {
    2_000
}

fn default_top_n() -> usize {
    3
}

fn default_min_relevance() -> f64 {
    0.3
}

fn default_verify_threshold() -> f64 {
    0.6
}

fn default_max_claims() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = GroundingConfig::default();
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.retrieval.n_results, 3);
        assert_eq!(config.verification.min_relevance, 0.3);
        assert_eq!(config.verification.verify_threshold, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: GroundingConfig = toml::from_str("").unwrap();
        assert_eq!(config, GroundingConfig::default());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml_str = r#"
[embedding]
provider = "openai"
dimension = 1536

[verification]
verify_threshold = 0.75
"#;
        let config: GroundingConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.embedding.max_input_chars, 2_000);
        assert_eq!(config.verification.verify_threshold, 0.75);
        assert_eq!(config.verification.top_n, 3);
        assert_eq!(config.generation.model, "gpt-4o-mini");
    }

    #[test]
    fn test_validate_rejects_min_relevance_of_one() {
        let mut config = GroundingConfig::default();
        config.verification.min_relevance = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut config = GroundingConfig::default();
        config.retrieval.max_context_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retrieval.max_context_chars"));
    }
}
