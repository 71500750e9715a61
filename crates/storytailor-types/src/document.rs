//! Knowledge document types.
//!
//! A [`Document`] is a short factual text with a source label and its
//! embedding. Documents are owned by the knowledge store and handed out as
//! `Arc<Document>` so retrieval results can reference them without copying
//! the embedding.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GroundingError;

/// Current version of the knowledge snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Unique identifier for a knowledge document, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Create a new DocumentId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A stored knowledge document.
///
/// Immutable once stored; the only mutation the store supports is removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// The factual text.
    pub text: String,
    /// Human-readable source label (e.g., "Animal Encyclopedia").
    pub source: String,
    /// Embedding vector; every document in one store shares its length.
    pub embedding: Vec<f32>,
    pub added_at: DateTime<Utc>,
}

/// A document waiting to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub text: String,
    pub source: String,
}

impl NewDocument {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }

    /// Pair up parallel `texts` and `sources` lists.
    ///
    /// Fails with `InvalidInput` when the lengths differ.
    pub fn zip(texts: Vec<String>, sources: Vec<String>) -> Result<Vec<Self>, GroundingError> {
        if texts.len() != sources.len() {
            return Err(GroundingError::InvalidInput(format!(
                "got {} texts but {} sources",
                texts.len(),
                sources.len()
            )));
        }
        Ok(texts
            .into_iter()
            .zip(sources)
            .map(|(text, source)| Self { text, source })
            .collect())
    }
}

/// A document matched by a nearest-neighbor query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub document: Arc<Document>,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f64,
}

/// A single document as written to a knowledge snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
    pub added_at: DateTime<Utc>,
}

impl From<&Document> for DocumentRecord {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            text: doc.text.clone(),
            source: doc.source.clone(),
            embedding: doc.embedding.clone(),
            added_at: doc.added_at,
        }
    }
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            source: record.source,
            embedding: record.embedding,
            added_at: record.added_at,
        }
    }
}

/// Serializable image of a knowledge base.
///
/// Records are kept in insertion order so a restored store ranks ties the
/// same way the original did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    pub version: u32,
    /// Embedding dimension shared by every record.
    pub dimension: usize,
    /// Name of the embedding model that produced the vectors, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    pub documents: Vec<DocumentRecord>,
}

impl KnowledgeSnapshot {
    /// Check the snapshot's internal consistency.
    ///
    /// Every record must match `dimension` and ids must be unique.
    pub fn validate(&self) -> Result<(), GroundingError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GroundingError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }

        let mut seen = HashSet::with_capacity(self.documents.len());
        for record in &self.documents {
            if record.embedding.len() != self.dimension {
                return Err(GroundingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.len(),
                });
            }
            if !seen.insert(record.id) {
                return Err(GroundingError::DuplicateId(record.id));
            }
        }
        Ok(())
    }
}

/// Summary counters for a knowledge store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub dimension: usize,
    /// Distinct source labels in first-seen order.
    pub sources: Vec<String>,
}
