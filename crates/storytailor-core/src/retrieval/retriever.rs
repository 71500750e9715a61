//! Retriever: embed the query text, then nearest-neighbor search.

use std::sync::Arc;

use storytailor_types::document::RetrievalResult;
use storytailor_types::error::GroundingError;

use crate::embedding::EmbeddingGateway;
use crate::knowledge::{FlatIndex, KnowledgeStore, VectorIndex};

/// Shared handle over a knowledge store and the gateway that embeds queries.
pub struct Retriever<I: VectorIndex = FlatIndex> {
    store: Arc<KnowledgeStore<I>>,
    gateway: Arc<EmbeddingGateway>,
}

// Manual impl: `I` itself does not need to be `Clone`.
impl<I: VectorIndex> Clone for Retriever<I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<I: VectorIndex> Retriever<I> {
    pub fn new(store: Arc<KnowledgeStore<I>>, gateway: Arc<EmbeddingGateway>) -> Self {
        Self { store, gateway }
    }

    pub fn store(&self) -> &Arc<KnowledgeStore<I>> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<EmbeddingGateway> {
        &self.gateway
    }

    /// Up to `n_results` documents ranked by similarity to `query`.
    ///
    /// Gateway failures (`EmbeddingUnavailable`, `Timeout`, input errors)
    /// propagate unchanged.
    pub async fn retrieve(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievalResult>, GroundingError> {
        self.retrieve_filtered(query, n_results, None).await
    }

    /// Like [`retrieve`](Self::retrieve), restricted to documents whose
    /// source label equals `source` when one is given.
    pub async fn retrieve_filtered(
        &self,
        query: &str,
        n_results: usize,
        source: Option<&str>,
    ) -> Result<Vec<RetrievalResult>, GroundingError> {
        if n_results == 0 {
            return Err(GroundingError::InvalidInput(
                "n_results must be positive".to_string(),
            ));
        }

        let embedding = self.gateway.embed(query).await?;
        let results = match source {
            Some(source) => {
                self.store
                    .search_where(&embedding, n_results, |d| d.source == source)
                    .await?
            }
            None => self.store.search(&embedding, n_results).await?,
        };

        tracing::debug!(
            n_results,
            source,
            found = results.len(),
            best = results.first().map(|r| r.score),
            "retrieved knowledge"
        );
        Ok(results)
    }
}
