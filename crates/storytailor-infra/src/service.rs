//! GroundingService: the assembled grounding subsystem.
//!
//! Owns one knowledge store and shares it (by `Arc`) with the retriever,
//! fact checker and story orchestrator. Built from a [`GroundingConfig`]
//! with [`GroundingServiceBuilder`]; backends default to what the
//! configuration names and can be injected for tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use storytailor_core::embedding::{BoxEmbedder, EmbeddingGateway};
use storytailor_core::knowledge::KnowledgeStore;
use storytailor_core::retrieval::Retriever;
use storytailor_core::story::{BoxStoryGenerator, OrchestratorOptions, StoryOrchestrator};
use storytailor_core::verify::{FactChecker, VerificationPolicy};
use storytailor_types::config::GroundingConfig;
use storytailor_types::document::{Document, DocumentId, NewDocument, RetrievalResult, StoreStats};
use storytailor_types::error::GroundingError;
use storytailor_types::story::{GeneratedStoryResult, StoryRequest};
use storytailor_types::verification::VerificationVerdict;

use crate::config::{SNAPSHOT_FILE, api_key_from_env, load_config};
use crate::embedding::create_embedder;
use crate::generation::create_story_generator;
use crate::seed::default_knowledge;
use crate::snapshot::{load_snapshot, save_snapshot};

pub struct GroundingService {
    config: GroundingConfig,
    store: Arc<KnowledgeStore>,
    retriever: Retriever,
    fact_checker: FactChecker,
    orchestrator: StoryOrchestrator,
    snapshot_path: Option<PathBuf>,
}

impl GroundingService {
    pub fn builder(config: GroundingConfig) -> GroundingServiceBuilder {
        GroundingServiceBuilder::new(config)
    }

    /// Open the service for a data directory: `config.toml`, the
    /// `knowledge.json` snapshot (if any), and `OPENAI_API_KEY`.
    pub async fn open(data_dir: &Path) -> Result<Self, GroundingError> {
        let config = load_config(data_dir).await;
        Self::builder(config)
            .snapshot_path(data_dir.join(SNAPSHOT_FILE))
            .api_key(api_key_from_env())
            .build()
            .await
    }

    pub fn config(&self) -> &GroundingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn generator_name(&self) -> &str {
        self.orchestrator.generator_name()
    }

    /// Embed and store parallel `texts` / `sources` lists.
    pub async fn add_documents(
        &self,
        texts: Vec<String>,
        sources: Vec<String>,
    ) -> Result<Vec<Arc<Document>>, GroundingError> {
        let documents = NewDocument::zip(texts, sources)?;
        self.add(&documents).await
    }

    pub async fn add(&self, documents: &[NewDocument]) -> Result<Vec<Arc<Document>>, GroundingError> {
        self.store.add(self.retriever.gateway(), documents).await
    }

    pub async fn remove(&self, id: &DocumentId) -> Option<Arc<Document>> {
        self.store.remove(id).await
    }

    pub async fn retrieve(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievalResult>, GroundingError> {
        self.retriever.retrieve(query, n_results).await
    }

    /// Retrieval restricted to documents from one source.
    pub async fn retrieve_from(
        &self,
        query: &str,
        n_results: usize,
        source: &str,
    ) -> Result<Vec<RetrievalResult>, GroundingError> {
        self.retriever
            .retrieve_filtered(query, n_results, Some(source))
            .await
    }

    pub async fn fact_check(&self, statement: &str) -> Result<VerificationVerdict, GroundingError> {
        self.fact_checker.fact_check(statement).await
    }

    pub async fn generate_story_with_grounding(
        &self,
        request: &StoryRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedStoryResult, GroundingError> {
        self.orchestrator.generate(request, cancel).await
    }

    /// Add the default knowledge entries that are not already stored.
    ///
    /// Returns how many documents were added; running it twice (even
    /// concurrently) adds nothing the second time.
    pub async fn seed_defaults(&self) -> Result<usize, GroundingError> {
        let added = self
            .store
            .add_missing(self.retriever.gateway(), &default_knowledge())
            .await?;
        if added.is_empty() {
            tracing::info!("default knowledge already present");
        }
        Ok(added.len())
    }

    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Write the knowledge base to the configured snapshot path.
    pub async fn save(&self) -> Result<PathBuf, GroundingError> {
        let path = self.snapshot_path.clone().ok_or_else(|| {
            GroundingError::InvalidInput("no snapshot path configured".to_string())
        })?;
        save_snapshot(&path, &self.store.snapshot().await).await?;
        Ok(path)
    }

    /// Save when the document count differs from `before`.
    ///
    /// Meant to follow a mutation that may have failed part way: documents
    /// stored before the failure are persisted too.
    pub async fn save_if_changed(&self, before: usize) -> Result<Option<PathBuf>, GroundingError> {
        if self.store.len().await == before {
            return Ok(None);
        }
        self.save().await.map(Some)
    }
}

/// Builder for [`GroundingService`].
pub struct GroundingServiceBuilder {
    config: GroundingConfig,
    embedder: Option<BoxEmbedder>,
    generator: Option<BoxStoryGenerator>,
    api_key: Option<SecretString>,
    snapshot_path: Option<PathBuf>,
}

impl GroundingServiceBuilder {
    pub fn new(config: GroundingConfig) -> Self {
        Self {
            config,
            embedder: None,
            generator: None,
            api_key: None,
            snapshot_path: None,
        }
    }

    /// Use this embedder instead of the configured one.
    pub fn embedder(mut self, embedder: BoxEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Use this story generator instead of the configured one.
    pub fn generator(mut self, generator: BoxStoryGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Restore from (and save to) this snapshot file.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub async fn build(self) -> Result<GroundingService, GroundingError> {
        let config = self.config;
        config.validate()?;

        let embedder = match self.embedder {
            Some(embedder) => embedder,
            None => create_embedder(&config.embedding, self.api_key.clone())?,
        };
        let generator = match self.generator {
            Some(generator) => generator,
            None => create_story_generator(&config.generation, self.api_key),
        };

        let gateway = Arc::new(EmbeddingGateway::new(
            embedder,
            Duration::from_millis(config.embedding.timeout_ms),
            config.embedding.max_input_chars,
        ));
        let store = Arc::new(
            KnowledgeStore::new(gateway.dimension()).with_embedding_model(gateway.model_name()),
        );

        if let Some(path) = &self.snapshot_path {
            if let Some(snapshot) = load_snapshot(path).await? {
                store.restore(snapshot).await?;
            }
        }

        let policy = VerificationPolicy::try_from(&config.verification)?;
        let retriever = Retriever::new(Arc::clone(&store), gateway);
        let fact_checker = FactChecker::new(retriever.clone(), policy);
        let orchestrator = StoryOrchestrator::new(
            retriever.clone(),
            fact_checker.clone(),
            Arc::new(generator),
            OrchestratorOptions::from(&config),
        );

        let documents = store.len().await;
        tracing::info!(
            embedder = retriever.gateway().model_name(),
            dimension = store.dimension(),
            documents,
            generator = orchestrator.generator_name(),
            "grounding service ready"
        );

        Ok(GroundingService {
            config,
            store,
            retriever,
            fact_checker,
            orchestrator,
            snapshot_path: self.snapshot_path,
        })
    }
}
