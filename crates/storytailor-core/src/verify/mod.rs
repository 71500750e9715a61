//! Post-hoc fact verification.
//!
//! [`VerificationPolicy`] is the pure scoring rule, [`extract_claims`] splits
//! generated text into checkable sentences, and [`FactChecker`] ties both to
//! a [`Retriever`](crate::retrieval::Retriever).

pub mod claims;
pub mod confidence;
pub mod fact_checker;

pub use claims::extract_claims;
pub use confidence::{
    DEFAULT_MIN_RELEVANCE, DEFAULT_TOP_N, DEFAULT_VERIFY_THRESHOLD, VerificationPolicy,
};
pub use fact_checker::FactChecker;
