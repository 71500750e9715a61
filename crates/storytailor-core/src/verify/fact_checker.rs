//! Fact checker: retrieve evidence for a statement and judge it.

use storytailor_types::error::GroundingError;
use storytailor_types::verification::{ClaimVerdict, VerificationVerdict};

use super::confidence::VerificationPolicy;
use crate::knowledge::{FlatIndex, VectorIndex};
use crate::retrieval::Retriever;

pub struct FactChecker<I: VectorIndex = FlatIndex> {
    retriever: Retriever<I>,
    policy: VerificationPolicy,
}

impl<I: VectorIndex> Clone for FactChecker<I> {
    fn clone(&self) -> Self {
        Self {
            retriever: self.retriever.clone(),
            policy: self.policy,
        }
    }
}

impl<I: VectorIndex> FactChecker<I> {
    pub fn new(retriever: Retriever<I>, policy: VerificationPolicy) -> Self {
        Self { retriever, policy }
    }

    /// Input errors surface as errors, never as a low-confidence verdict.
    pub async fn fact_check(&self, statement: &str) -> Result<VerificationVerdict, GroundingError> {
        let statement = statement.trim();
        if statement.is_empty() {
            return Err(GroundingError::InvalidInput(
                "statement must not be empty".to_string(),
            ));
        }
        self.retriever.gateway().check_input(statement)?;

        let evidence = self.retriever.retrieve(statement, self.policy.top_n).await?;
        let verdict = self.policy.judge(&evidence);

        tracing::debug!(
            verified = verdict.verified,
            confidence = verdict.confidence,
            source = verdict.matched_source.as_deref().unwrap_or("-"),
            "fact checked statement"
        );
        Ok(verdict)
    }

    /// Check each claim in order, stopping at the first error.
    pub async fn fact_check_all(&self, claims: &[String]) -> Result<Vec<ClaimVerdict>, GroundingError> {
        let mut verdicts = Vec::with_capacity(claims.len());
        for claim in claims {
            let verdict = self.fact_check(claim).await?;
            verdicts.push(ClaimVerdict {
                claim: claim.clone(),
                verdict,
            });
        }
        Ok(verdicts)
    }
}
