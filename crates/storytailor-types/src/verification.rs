//! Fact verification types.

use serde::{Deserialize, Serialize};

/// Message used when no retrieved document is relevant enough.
pub const NO_EVIDENCE_MESSAGE: &str = "no supporting evidence found";

/// Outcome of checking one statement against the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    /// True iff `confidence` reached the verification threshold.
    pub verified: bool,
    /// How strongly the best evidence supports the statement, in [0, 1].
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_text: Option<String>,
    /// Short human-readable rationale.
    pub message: String,
}

impl VerificationVerdict {
    /// Verdict for a statement with no relevant evidence.
    pub fn unsupported() -> Self {
        Self {
            verified: false,
            confidence: 0.0,
            matched_source: None,
            evidence_text: None,
            message: NO_EVIDENCE_MESSAGE.to_string(),
        }
    }
}

/// Verdict for one claim extracted from a generated story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim: String,
    pub verdict: VerificationVerdict,
}
