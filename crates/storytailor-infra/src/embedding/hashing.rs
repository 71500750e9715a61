//! Local feature-hashing embedder.
//!
//! Deterministic bag-of-words vectors that need no model download or
//! network: text is lowercased and split on non-alphanumeric characters,
//! common English stopwords are dropped, a trailing plural `s` is folded,
//! and each remaining token adds 1.0 to the bucket chosen by its SHA-256
//! digest. The result is L2-normalized, so cosine similarity measures token
//! overlap. Good enough for offline use and tests; swap in the OpenAI
//! embedder for paraphrase-level matching.

use sha2::{Digest, Sha256};

use storytailor_core::embedding::Embedder;
use storytailor_types::error::GroundingError;

/// Model name recorded in snapshots built with this embedder.
pub const HASHING_MODEL_NAME: &str = "feature-hash-v1";

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "to", "of", "and", "or", "in", "on", "at",
    "for", "with", "it", "its", "be", "by", "up", "as", "that", "this",
];

pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }
}

impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_name(&self) -> &str {
        HASHING_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let tokens: Vec<String> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(fold_plural)
        .collect();

    // Text made only of stopwords or punctuation still gets a vector.
    if tokens.is_empty() && !lower.trim().is_empty() {
        return vec![lower.trim().to_string()];
    }
    tokens
}

fn fold_plural(token: &str) -> String {
    if token.chars().count() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}
