//! The knowledge base: documents, their embeddings, and similarity search.

pub mod index;
pub mod store;

pub use index::{FlatIndex, SCORE_EPSILON, VectorIndex, cosine_similarity};
pub use store::KnowledgeStore;
