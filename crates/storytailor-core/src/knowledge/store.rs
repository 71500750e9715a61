//! In-process knowledge store.
//!
//! Holds documents with their embeddings and source labels behind a
//! single-writer / multiple-reader lock. Readers (`search`, `snapshot`,
//! `stats`) never block each other; inserts, removals and restores are
//! exclusive. Mutations also serialize on a writer mutex held for a whole
//! `add` batch, so concurrent batches never interleave. Embedding happens
//! outside the index lock, so a slow gateway never holds up readers.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use storytailor_types::document::{
    Document, DocumentId, DocumentRecord, KnowledgeSnapshot, NewDocument, RetrievalResult,
    SNAPSHOT_VERSION, StoreStats,
};
use storytailor_types::error::GroundingError;

use super::index::{FlatIndex, VectorIndex};
use crate::embedding::EmbeddingGateway;

/// A knowledge base of fixed embedding dimension.
///
/// Constructed explicitly (empty or from a snapshot) and shared by `Arc`
/// with the retriever, fact checker and story orchestrator.
pub struct KnowledgeStore<I: VectorIndex = FlatIndex> {
    dimension: usize,
    embedding_model: Option<String>,
    index: RwLock<I>,
    writer: Mutex<()>,
}

impl<I: VectorIndex> KnowledgeStore<I> {
    /// Create an empty store for embeddings of `dimension` floats.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            embedding_model: None,
            index: RwLock::new(I::default()),
            writer: Mutex::new(()),
        }
    }

    /// Record the embedding model name; snapshots from other models are refused.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    /// Embed and store each document in order.
    ///
    /// Each document is stored all-or-nothing, but the batch is not atomic:
    /// if embedding fails part way, the documents before the failure stay
    /// stored and the error is returned. Concurrent calls run one batch at a
    /// time, so each batch lands contiguously in insertion order.
    pub async fn add(
        &self,
        gateway: &EmbeddingGateway,
        documents: &[NewDocument],
    ) -> Result<Vec<Arc<Document>>, GroundingError> {
        self.check_gateway(gateway)?;
        let _writer = self.writer.lock().await;
        self.add_locked(gateway, documents).await
    }

    /// Add only the documents whose `(text, source)` pair is not stored yet.
    ///
    /// The check and the insert happen under one writer lock, so two
    /// concurrent calls with the same documents store them once.
    pub async fn add_missing(
        &self,
        gateway: &EmbeddingGateway,
        documents: &[NewDocument],
    ) -> Result<Vec<Arc<Document>>, GroundingError> {
        self.check_gateway(gateway)?;
        let _writer = self.writer.lock().await;

        let existing: HashSet<(String, String)> = self
            .index
            .read()
            .await
            .documents()
            .iter()
            .map(|d| (d.text.clone(), d.source.clone()))
            .collect();
        let mut seen = HashSet::new();
        let missing: Vec<NewDocument> = documents
            .iter()
            .filter(|d| {
                let key = (d.text.clone(), d.source.clone());
                !existing.contains(&key) && seen.insert(key)
            })
            .cloned()
            .collect();

        if missing.is_empty() {
            tracing::debug!("all documents already stored");
            return Ok(Vec::new());
        }
        self.add_locked(gateway, &missing).await
    }

    fn check_gateway(&self, gateway: &EmbeddingGateway) -> Result<(), GroundingError> {
        if gateway.dimension() != self.dimension {
            return Err(GroundingError::DimensionMismatch {
                expected: self.dimension,
                actual: gateway.dimension(),
            });
        }
        Ok(())
    }

    /// Caller holds `writer`.
    async fn add_locked(
        &self,
        gateway: &EmbeddingGateway,
        documents: &[NewDocument],
    ) -> Result<Vec<Arc<Document>>, GroundingError> {
        let mut stored = Vec::with_capacity(documents.len());
        for new_doc in documents {
            if new_doc.source.trim().is_empty() {
                return Err(GroundingError::InvalidInput(
                    "document source must not be empty".to_string(),
                ));
            }

            let embedding = match gateway.embed(&new_doc.text).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    if !stored.is_empty() {
                        tracing::warn!(
                            stored = stored.len(),
                            remaining = documents.len() - stored.len(),
                            "knowledge ingestion stopped part way: {e}"
                        );
                    }
                    return Err(e);
                }
            };

            let doc = self
                .insert_locked(new_doc.text.clone(), new_doc.source.clone(), embedding)
                .await?;
            stored.push(doc);
        }

        let total = self.len().await;
        tracing::info!(added = stored.len(), total, "added knowledge documents");
        Ok(stored)
    }

    /// Store one already-embedded document under a fresh id.
    pub async fn insert(
        &self,
        text: String,
        source: String,
        embedding: Vec<f32>,
    ) -> Result<Arc<Document>, GroundingError> {
        let _writer = self.writer.lock().await;
        self.insert_locked(text, source, embedding).await
    }

    /// Caller holds `writer`.
    async fn insert_locked(
        &self,
        text: String,
        source: String,
        embedding: Vec<f32>,
    ) -> Result<Arc<Document>, GroundingError> {
        if embedding.len() != self.dimension {
            return Err(GroundingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let doc = Arc::new(Document {
            id: DocumentId::new(),
            text,
            source,
            embedding,
            added_at: Utc::now(),
        });

        self.index.write().await.insert(Arc::clone(&doc))?;
        tracing::debug!(id = %doc.id, source = %doc.source, "stored document");
        Ok(doc)
    }

    /// The `k` documents most similar to `query_embedding`, best first.
    ///
    /// Returns `min(k, len)` results; an empty store yields an empty list.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievalResult>, GroundingError> {
        self.search_where(query_embedding, k, |_| true).await
    }

    /// Like [`search`](Self::search), over only the documents `keep` accepts.
    pub async fn search_where<F>(
        &self,
        query_embedding: &[f32],
        k: usize,
        keep: F,
    ) -> Result<Vec<RetrievalResult>, GroundingError>
    where
        F: Fn(&Document) -> bool + Send,
    {
        if k == 0 {
            return Err(GroundingError::InvalidInput(
                "number of results must be positive".to_string(),
            ));
        }
        if query_embedding.len() != self.dimension {
            return Err(GroundingError::DimensionMismatch {
                expected: self.dimension,
                actual: query_embedding.len(),
            });
        }

        let index = self.index.read().await;
        Ok(index.nearest_where(query_embedding, k, &keep))
    }

    pub async fn get(&self, id: &DocumentId) -> Option<Arc<Document>> {
        self.index.read().await.get(id)
    }

    /// Delete a document. Returns it if it was present.
    pub async fn remove(&self, id: &DocumentId) -> Option<Arc<Document>> {
        let _writer = self.writer.lock().await;
        let removed = self.index.write().await.remove(id);
        if let Some(doc) = &removed {
            tracing::info!(id = %doc.id, source = %doc.source, "removed document");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let documents = self.index.read().await.documents();
        let mut seen = HashSet::new();
        let sources = documents
            .iter()
            .filter(|d| seen.insert(d.source.as_str()))
            .map(|d| d.source.clone())
            .collect();

        StoreStats {
            total_documents: documents.len(),
            dimension: self.dimension,
            sources,
        }
    }

    /// Serializable image of every document, in insertion order.
    pub async fn snapshot(&self) -> KnowledgeSnapshot {
        let documents = self.index.read().await.documents();
        KnowledgeSnapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            embedding_model: self.embedding_model.clone(),
            documents: documents.iter().map(|d| DocumentRecord::from(d.as_ref())).collect(),
        }
    }

    /// Replace the store contents with `snapshot`.
    ///
    /// The snapshot is fully validated and indexed before the swap, so on any
    /// error the store keeps its previous contents.
    pub async fn restore(&self, snapshot: KnowledgeSnapshot) -> Result<(), GroundingError> {
        snapshot.validate()?;

        if snapshot.dimension != self.dimension {
            return Err(GroundingError::DimensionMismatch {
                expected: self.dimension,
                actual: snapshot.dimension,
            });
        }
        if let (Some(ours), Some(theirs)) = (&self.embedding_model, &snapshot.embedding_model) {
            if ours != theirs {
                return Err(GroundingError::Snapshot(format!(
                    "snapshot was embedded with '{theirs}', store uses '{ours}'"
                )));
            }
        }

        let restored = build_index::<I>(snapshot.documents)?;
        let count = restored.len();
        let _writer = self.writer.lock().await;
        *self.index.write().await = restored;

        tracing::info!(documents = count, "restored knowledge snapshot");
        Ok(())
    }
}

fn build_index<I: VectorIndex>(records: Vec<DocumentRecord>) -> Result<I, GroundingError> {
    let mut index = I::default();
    for record in records {
        index.insert(Arc::new(Document::from(record)))?;
    }
    Ok(index)
}
