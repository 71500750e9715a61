//! Nearest-neighbor index behind the knowledge store.
//!
//! [`VectorIndex`] is the seam for swapping in an approximate index later.
//! [`FlatIndex`] is an exact linear scan with cosine similarity, which is
//! fast enough for knowledge bases of a few thousand short documents.

use std::collections::HashMap;
use std::sync::Arc;

use storytailor_types::document::{Document, DocumentId, RetrievalResult};
use storytailor_types::error::GroundingError;

/// Scores closer than this are ties and keep insertion order.
pub const SCORE_EPSILON: f64 = 1e-9;

/// An index over stored documents supporting k-nearest-neighbor queries.
///
/// Implementations must remember insertion order: `documents()` returns it
/// and `nearest()` uses it to break score ties (earlier document first).
pub trait VectorIndex: Default + Send + Sync {
    /// Add a document. Fails with `DuplicateId` if the id is already present.
    fn insert(&mut self, document: Arc<Document>) -> Result<(), GroundingError>;

    fn remove(&mut self, id: &DocumentId) -> Option<Arc<Document>>;

    fn get(&self, id: &DocumentId) -> Option<Arc<Document>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All documents in insertion order.
    fn documents(&self) -> Vec<Arc<Document>>;

    /// The `k` documents most similar to `query`, best first.
    fn nearest(&self, query: &[f32], k: usize) -> Vec<RetrievalResult> {
        self.nearest_where(query, k, &|_: &Document| true)
    }

    /// Like `nearest`, skipping documents `keep` rejects.
    fn nearest_where(
        &self,
        query: &[f32],
        k: usize,
        keep: &dyn Fn(&Document) -> bool,
    ) -> Vec<RetrievalResult>;
}

/// Exact index: scores every document on each query.
#[derive(Debug, Default)]
pub struct FlatIndex {
    documents: Vec<Arc<Document>>,
    positions: HashMap<DocumentId, usize>,
}

impl VectorIndex for FlatIndex {
    fn insert(&mut self, document: Arc<Document>) -> Result<(), GroundingError> {
        if self.positions.contains_key(&document.id) {
            return Err(GroundingError::DuplicateId(document.id));
        }
        self.positions.insert(document.id, self.documents.len());
        self.documents.push(document);
        Ok(())
    }

    fn remove(&mut self, id: &DocumentId) -> Option<Arc<Document>> {
        let pos = self.positions.remove(id)?;
        let removed = self.documents.remove(pos);
        for doc in &self.documents[pos..] {
            if let Some(p) = self.positions.get_mut(&doc.id) {
                *p -= 1;
            }
        }
        Some(removed)
    }

    fn get(&self, id: &DocumentId) -> Option<Arc<Document>> {
        self.positions
            .get(id)
            .map(|&pos| Arc::clone(&self.documents[pos]))
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn documents(&self) -> Vec<Arc<Document>> {
        self.documents.clone()
    }

    fn nearest_where(
        &self,
        query: &[f32],
        k: usize,
        keep: &dyn Fn(&Document) -> bool,
    ) -> Vec<RetrievalResult> {
        let scored: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| keep(doc))
            .map(|(pos, doc)| (pos, cosine_similarity(query, &doc.embedding)))
            .collect();

        rank_by_score(scored, k)
            .into_iter()
            .map(|(pos, score)| RetrievalResult {
                document: Arc::clone(&self.documents[pos]),
                score,
            })
            .collect()
    }
}

/// Sort `(insertion_position, score)` pairs best-first and keep `k`.
///
/// Runs of scores within [`SCORE_EPSILON`] of their neighbor are reordered
/// by insertion position so ranking is deterministic.
pub fn rank_by_score(mut scored: Vec<(usize, f64)>, k: usize) -> Vec<(usize, f64)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut start = 0;
    while start < scored.len() {
        let mut end = start + 1;
        while end < scored.len() && (scored[end - 1].1 - scored[end].1).abs() <= SCORE_EPSILON {
            end += 1;
        }
        if end - start > 1 {
            scored[start..end].sort_by(|a, b| a.0.cmp(&b.0));
        }
        start = end;
    }

    scored.truncate(k);
    scored
}

/// Cosine similarity in [-1, 1], computed in f64.
///
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(text: &str, embedding: Vec<f32>) -> Arc<Document> {
        Arc::new(Document {
            id: DocumentId::new(),
            text: text.to_string(),
            source: "test".to_string(),
            embedding,
            added_at: Utc::now(),
        })
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let mut index = FlatIndex::default();
        let d = doc("a", vec![1.0, 0.0]);
        index.insert(Arc::clone(&d)).unwrap();
        assert!(matches!(index.insert(d), Err(GroundingError::DuplicateId(_))));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_nearest_orders_by_descending_score() {
        let mut index = FlatIndex::default();
        index.insert(doc("far", vec![0.0, 1.0])).unwrap();
        index.insert(doc("near", vec![1.0, 0.1])).unwrap();
        index.insert(doc("mid", vec![1.0, 1.0])).unwrap();

        let results = index.nearest(&[1.0, 0.0], 3);
        let texts: Vec<&str> = results.iter().map(|r| r.document.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "mid", "far"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_nearest_truncates_to_k() {
        let mut index = FlatIndex::default();
        for i in 0..5 {
            index.insert(doc(&format!("d{i}"), vec![1.0, i as f32])).unwrap();
        }
        assert_eq!(index.nearest(&[1.0, 0.0], 2).len(), 2);
        assert_eq!(index.nearest(&[1.0, 0.0], 10).len(), 5);
    }

    #[test]
    fn test_nearest_ties_keep_insertion_order() {
        let mut index = FlatIndex::default();
        index.insert(doc("other", vec![0.0, 1.0])).unwrap();
        index.insert(doc("first", vec![2.0, 0.0])).unwrap();
        index.insert(doc("second", vec![1.0, 0.0])).unwrap();
        index.insert(doc("third", vec![3.0, 0.0])).unwrap();

        let results = index.nearest(&[1.0, 0.0], 4);
        let texts: Vec<&str> = results.iter().map(|r| r.document.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third", "other"]);
    }

    #[test]
    fn test_rank_by_score_groups_near_equal_scores() {
        let ranked = rank_by_score(vec![(0, 0.5), (2, 0.5 + 1e-12), (1, 0.9)], 3);
        let order: Vec<usize> = ranked.iter().map(|(pos, _)| *pos).collect();
        // position 2 scores a hair higher but ties with 0 and was inserted later
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_remove_keeps_positions_consistent() {
        let mut index = FlatIndex::default();
        let a = doc("a", vec![1.0, 0.0]);
        let b = doc("b", vec![0.0, 1.0]);
        let c = doc("c", vec![1.0, 1.0]);
        for d in [&a, &b, &c] {
            index.insert(Arc::clone(d)).unwrap();
        }

        assert_eq!(index.remove(&a.id).map(|d| d.text.clone()), Some("a".to_string()));
        assert!(index.get(&a.id).is_none());
        assert_eq!(index.get(&c.id).map(|d| d.text.clone()), Some("c".to_string()));
        let texts: Vec<String> = index.documents().iter().map(|d| d.text.clone()).collect();
        assert_eq!(texts, vec!["b", "c"]);
        assert!(index.remove(&a.id).is_none());
    }

    #[test]
    fn test_nearest_where_keeps_ranking_among_accepted() {
        let mut index = FlatIndex::default();
        index.insert(doc("best", vec![1.0, 0.0])).unwrap();
        index.insert(doc("mid", vec![1.0, 1.0])).unwrap();
        index.insert(doc("far", vec![0.0, 1.0])).unwrap();

        let results = index.nearest_where(&[1.0, 0.0], 5, &|d: &Document| d.text != "best");
        let texts: Vec<&str> = results.iter().map(|r| r.document.text.as_str()).collect();
        assert_eq!(texts, vec!["mid", "far"]);
    }

    #[test]
    fn test_nearest_on_empty_index() {
        let index = FlatIndex::default();
        assert!(index.is_empty());
        assert!(index.nearest(&[1.0], 3).is_empty());
    }
}
