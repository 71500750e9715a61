//! Test doubles for the embedder and story generator ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storytailor_types::document::NewDocument;
use storytailor_types::error::GroundingError;
use storytailor_types::story::StoryConstraints;

use crate::embedding::{BoxEmbedder, Embedder, EmbeddingGateway};
use crate::knowledge::KnowledgeStore;
use crate::retrieval::Retriever;
use crate::story::{StoryGenerator, StoryPrompt};

/// One binary feature per vocabulary word, L2-normalized.
///
/// A token matches a word when it starts with it, so "rabbits" and "runs"
/// hit "rabbit" and "run". Text with no known word embeds to all zeros.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn animals() -> Self {
        Self {
            vocabulary: vec![
                "rabbit", "run", "fast", "whale", "ocean", "swim", "fox", "forest", "penguin",
                "fly", "bird", "mars", "blue", "carrot", "friend", "courage",
            ],
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut v: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|word| {
                if tokens.iter().any(|t| t.starts_with(word)) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keywords"
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }
}

pub struct FailingEmbedder {
    dimension: usize,
}

impl FailingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        Err(GroundingError::EmbeddingUnavailable(
            "connection refused".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

pub struct SlowEmbedder {
    delay: Duration,
    dimension: usize,
}

impl SlowEmbedder {
    pub fn new(delay: Duration, dimension: usize) -> Self {
        Self { delay, dimension }
    }
}

impl Embedder for SlowEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        tokio::time::sleep(self.delay).await;
        Ok(texts.iter().map(|_| vec![1.0; self.dimension]).collect())
    }

    fn model_name(&self) -> &str {
        "slow"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Advertises 4 dimensions but returns 3.
pub struct WrongDimensionEmbedder;

impl Embedder for WrongDimensionEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
    }

    fn model_name(&self) -> &str {
        "wrong-dimension"
    }

    fn dimension(&self) -> usize {
        4
    }
}

/// Delegates to `inner` for the first `ok_calls` calls, then fails.
pub struct FlakyEmbedder<E> {
    inner: E,
    ok_calls: usize,
    calls: AtomicUsize,
}

impl<E: Embedder> FlakyEmbedder<E> {
    pub fn new(inner: E, ok_calls: usize) -> Self {
        Self {
            inner,
            ok_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

impl<E: Embedder> Embedder for FlakyEmbedder<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GroundingError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok_calls {
            return Err(GroundingError::EmbeddingUnavailable(
                "service went away".to_string(),
            ));
        }
        self.inner.embed(texts).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

/// Returns a fixed story and records every prompt it receives.
pub struct ScriptedGenerator {
    story: String,
    prompts: Arc<Mutex<Vec<StoryPrompt>>>,
}

impl ScriptedGenerator {
    pub fn new(story: impl Into<String>) -> Self {
        Self {
            story: story.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded prompts; take it before boxing the generator.
    pub fn prompts(&self) -> Arc<Mutex<Vec<StoryPrompt>>> {
        Arc::clone(&self.prompts)
    }
}

impl StoryGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        prompt: &StoryPrompt,
        _constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok(self.story.clone())
    }
}

pub struct FailingGenerator;

impl StoryGenerator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _prompt: &StoryPrompt,
        _constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        Err(GroundingError::GenerationFailed("model overloaded".to_string()))
    }
}

pub struct SlowGenerator {
    delay: Duration,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl StoryGenerator for SlowGenerator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(
        &self,
        _prompt: &StoryPrompt,
        _constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        tokio::time::sleep(self.delay).await;
        Ok("A story that took far too long to write.".to_string())
    }
}

pub fn keyword_gateway() -> EmbeddingGateway {
    EmbeddingGateway::new(
        BoxEmbedder::new(KeywordEmbedder::animals()),
        Duration::from_secs(1),
        500,
    )
}

/// Retriever over an empty store using [`KeywordEmbedder`].
pub fn keyword_retriever() -> Retriever {
    let gateway = keyword_gateway();
    let store = KnowledgeStore::new(gateway.dimension()).with_embedding_model(gateway.model_name());
    Retriever::new(Arc::new(store), Arc::new(gateway))
}

/// Retriever whose store already holds `(text, source)` documents.
pub async fn seeded_retriever(documents: &[(&str, &str)]) -> Retriever {
    let retriever = keyword_retriever();
    let docs: Vec<NewDocument> = documents
        .iter()
        .map(|(text, source)| NewDocument::new(*text, *source))
        .collect();
    retriever
        .store()
        .add(retriever.gateway(), &docs)
        .await
        .unwrap();
    retriever
}
