//! Mapping from similarity scores to verification verdicts.

use storytailor_types::config::VerificationSettings;
use storytailor_types::document::RetrievalResult;
use storytailor_types::error::GroundingError;
use storytailor_types::verification::VerificationVerdict;

pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.3;
pub const DEFAULT_VERIFY_THRESHOLD: f64 = 0.6;

/// Thresholds that turn the best evidence score into a verdict.
///
/// A best score below `min_relevance` counts as no evidence (confidence 0).
/// Scores in `[min_relevance, 1]` map linearly onto `[0.5, 1]`, and the
/// verdict is `verified` when that confidence reaches `verify_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationPolicy {
    pub top_n: usize,
    pub min_relevance: f64,
    pub verify_threshold: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
        }
    }
}

impl VerificationPolicy {
    pub fn new(top_n: usize, min_relevance: f64, verify_threshold: f64) -> Result<Self, GroundingError> {
        let policy = Self {
            top_n,
            min_relevance,
            verify_threshold,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), GroundingError> {
        if self.top_n == 0 {
            return Err(GroundingError::InvalidInput("top_n must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.min_relevance) {
            return Err(GroundingError::InvalidInput(format!(
                "min_relevance must be in [0, 1), got {}",
                self.min_relevance
            )));
        }
        if !(0.0..=1.0).contains(&self.verify_threshold) {
            return Err(GroundingError::InvalidInput(format!(
                "verify_threshold must be in [0, 1], got {}",
                self.verify_threshold
            )));
        }
        Ok(())
    }

    /// Confidence in [0, 1] for a best similarity score. Monotone in `score`.
    pub fn confidence(&self, score: f64) -> f64 {
        if score.is_nan() || score < self.min_relevance {
            return 0.0;
        }
        let span = 1.0 - self.min_relevance;
        let scaled = 0.5 + 0.5 * (score - self.min_relevance) / span;
        scaled.clamp(0.0, 1.0)
    }

    pub fn is_verified(&self, confidence: f64) -> bool {
        confidence >= self.verify_threshold
    }

    /// Verdict from ranked evidence (best first).
    pub fn judge(&self, evidence: &[RetrievalResult]) -> VerificationVerdict {
        let Some(best) = evidence.first() else {
            return VerificationVerdict::unsupported();
        };
        if best.score < self.min_relevance {
            return VerificationVerdict::unsupported();
        }

        let confidence = self.confidence(best.score);
        VerificationVerdict {
            verified: self.is_verified(confidence),
            confidence,
            matched_source: Some(best.document.source.clone()),
            evidence_text: Some(best.document.text.clone()),
            message: format!("matched: {}", best.document.source),
        }
    }
}

impl TryFrom<&VerificationSettings> for VerificationPolicy {
    type Error = GroundingError;

    fn try_from(settings: &VerificationSettings) -> Result<Self, Self::Error> {
        Self::new(settings.top_n, settings.min_relevance, settings.verify_threshold)
    }
}
