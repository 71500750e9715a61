//! Text-to-vector conversion.
//!
//! `Embedder` is the port implemented in storytailor-infra, `BoxEmbedder`
//! erases it for runtime selection, and `EmbeddingGateway` adds the input
//! length limit, the caller-supplied timeout and the dimension check.

pub mod box_embedder;
pub mod embedder;
pub mod gateway;

pub use box_embedder::BoxEmbedder;
pub use embedder::Embedder;
pub use gateway::EmbeddingGateway;
