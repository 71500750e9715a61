//! Grounded story orchestration.
//!
//! One request moves through named states:
//!
//! ```text
//! Retrieving -> Generating -> Verifying -> Done
//!      |             |
//!      | (degrade)   +--> Failed
//!      v
//! Generating (ungrounded) -> Done
//! ```
//!
//! Retrieval failures caused by the embedding backend (`EmbeddingUnavailable`,
//! `Timeout`) degrade to ungrounded generation. Generation failures are
//! fatal. Verification only runs when retrieval succeeded. There are no
//! retries inside the state machine; callers decide with
//! `GroundingError::is_retryable`.
//!
//! Cancellation is checked around the whole run: once the token fires the
//! in-flight future is dropped and the caller gets `Cancelled`, never a
//! partial result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use storytailor_types::config::GroundingConfig;
use storytailor_types::document::RetrievalResult;
use storytailor_types::error::GroundingError;
use storytailor_types::story::{GeneratedStoryResult, GenerationState, StoryRequest};
use storytailor_types::verification::ClaimVerdict;

use super::box_generator::BoxStoryGenerator;
use super::prompt::StoryPromptBuilder;
use crate::knowledge::{FlatIndex, VectorIndex};
use crate::retrieval::{InjectedContext, Retriever, build_context, preview};
use crate::verify::{FactChecker, extract_claims};

/// Tunables for one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Documents retrieved per story.
    pub n_results: usize,
    /// Character budget for the injected context block.
    pub max_context_chars: usize,
    /// Claims extracted from a story for verification.
    pub max_claims: usize,
    pub generation_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            n_results: 3,
            max_context_chars: 2000,
            max_claims: 5,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&GroundingConfig> for OrchestratorOptions {
    fn from(config: &GroundingConfig) -> Self {
        Self {
            n_results: config.retrieval.n_results,
            max_context_chars: config.retrieval.max_context_chars,
            max_claims: config.verification.max_claims,
            generation_timeout: Duration::from_millis(config.generation.timeout_ms),
        }
    }
}

pub struct StoryOrchestrator<I: VectorIndex = FlatIndex> {
    retriever: Retriever<I>,
    fact_checker: FactChecker<I>,
    generator: Arc<BoxStoryGenerator>,
    options: OrchestratorOptions,
}

impl<I: VectorIndex> StoryOrchestrator<I> {
    pub fn new(
        retriever: Retriever<I>,
        fact_checker: FactChecker<I>,
        generator: Arc<BoxStoryGenerator>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            retriever,
            fact_checker,
            generator,
            options,
        }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Generate a story for `request`, grounded when it opts in.
    pub async fn generate(
        &self,
        request: &StoryRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedStoryResult, GroundingError> {
        request.validate()?;

        let request_id = Uuid::now_v7();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(%request_id, "story generation cancelled");
                Err(GroundingError::Cancelled)
            }
            result = self.run(request_id, request) => result,
        }
    }

    async fn run(
        &self,
        request_id: Uuid,
        request: &StoryRequest,
    ) -> Result<GeneratedStoryResult, GroundingError> {
        let mut run = StoryRun::new(request_id);
        let query = request.retrieval_query();
        let constraints = request.constraints();

        // Retrieving. `None` means generation runs ungrounded.
        let retrieved: Option<Vec<RetrievalResult>> = if request.use_grounding {
            run.enter(GenerationState::Retrieving);
            match self.retriever.retrieve(&query, self.options.n_results).await {
                Ok(results) => Some(results),
                Err(e) if e.is_degradable() => {
                    tracing::warn!(%request_id, "retrieval unavailable, generating without grounding: {e}");
                    None
                }
                Err(e) => return Err(run.fail(e)),
            }
        } else {
            None
        };

        // Generating
        run.enter(GenerationState::Generating);
        let context = retrieved
            .as_deref()
            .map(|results| build_context(results, self.options.max_context_chars))
            .unwrap_or_default();
        let prompt = if retrieved.is_some() {
            StoryPromptBuilder::grounded(&constraints, &query, &context)
        } else {
            StoryPromptBuilder::ungrounded(&constraints, &query)
        };

        let story_text = match tokio::time::timeout(
            self.options.generation_timeout,
            self.generator.complete(&prompt, &constraints),
        )
        .await
        {
            Err(_) => {
                return Err(run.fail(GroundingError::Timeout {
                    operation: "generation".to_string(),
                    after_ms: self.options.generation_timeout.as_millis() as u64,
                }));
            }
            Ok(Err(e)) => return Err(run.fail(e)),
            Ok(Ok(text)) if text.trim().is_empty() => {
                return Err(run.fail(GroundingError::GenerationFailed(format!(
                    "{} returned an empty story",
                    self.generator.name()
                ))));
            }
            Ok(Ok(text)) => text,
        };

        // Verifying
        let verification = if retrieved.is_some() {
            run.enter(GenerationState::Verifying);
            self.verify(request_id, &story_text).await
        } else {
            Verification::skipped()
        };

        run.enter(GenerationState::Done);
        tracing::info!(
            %request_id,
            fact_checked = verification.fact_checked,
            confidence = verification.confidence,
            sources = context.used_sources.len(),
            elapsed_ms = run.elapsed_ms(),
            states = ?run.history,
            "story generated"
        );

        Ok(assemble(story_text, context, retrieved.as_deref(), verification))
    }

    async fn verify(&self, request_id: Uuid, story: &str) -> Verification {
        let max_chars = self.retriever.gateway().max_input_chars();
        let claims = extract_claims(story, self.options.max_claims, max_chars);
        if claims.is_empty() {
            tracing::warn!(%request_id, "no checkable claims in story");
            return Verification::skipped();
        }

        match self.fact_checker.fact_check_all(&claims).await {
            Ok(verdicts) => {
                for v in &verdicts {
                    tracing::debug!(
                        %request_id,
                        confidence = v.verdict.confidence,
                        verified = v.verdict.verified,
                        "claim: {}",
                        v.claim
                    );
                }
                let confidence = verdicts
                    .iter()
                    .map(|v| v.verdict.confidence)
                    .fold(1.0_f64, f64::min);
                Verification {
                    fact_checked: true,
                    confidence,
                    claims: verdicts,
                }
            }
            // The story already exists, so a verification failure only
            // downgrades the result.
            Err(e) => {
                tracing::warn!(%request_id, "verification failed, returning unchecked story: {e}");
                Verification::skipped()
            }
        }
    }
}

struct Verification {
    fact_checked: bool,
    confidence: f64,
    claims: Vec<ClaimVerdict>,
}

impl Verification {
    fn skipped() -> Self {
        Self {
            fact_checked: false,
            confidence: 0.0,
            claims: Vec::new(),
        }
    }
}

fn assemble(
    story_text: String,
    context: InjectedContext,
    retrieved: Option<&[RetrievalResult]>,
    verification: Verification,
) -> GeneratedStoryResult {
    let rag_context = retrieved
        .unwrap_or_default()
        .iter()
        .map(|r| preview(&r.document.text))
        .collect();

    GeneratedStoryResult {
        story_text,
        sources: context.used_sources,
        fact_checked: verification.fact_checked,
        confidence_score: verification.confidence.clamp(0.0, 1.0),
        rag_context,
        claims: verification.claims,
    }
}

/// State tracker for one request; every transition is logged.
struct StoryRun {
    request_id: Uuid,
    state: Option<GenerationState>,
    history: Vec<GenerationState>,
    started: Instant,
}

impl StoryRun {
    fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            state: None,
            history: Vec::with_capacity(4),
            started: Instant::now(),
        }
    }

    fn enter(&mut self, next: GenerationState) {
        debug_assert!(
            !self.state.is_some_and(|s| s.is_terminal()),
            "transition out of a terminal state"
        );
        tracing::info!(
            request_id = %self.request_id,
            from = self.state.map(|s| s.to_string()).unwrap_or_else(|| "start".to_string()),
            to = %next,
            "story state"
        );
        self.state = Some(next);
        self.history.push(next);
    }

    fn fail(&mut self, error: GroundingError) -> GroundingError {
        tracing::warn!(request_id = %self.request_id, "story generation failed: {error}");
        self.enter(GenerationState::Failed);
        error
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
