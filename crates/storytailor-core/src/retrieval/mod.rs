//! Query-side retrieval: embed a query, search the store, and turn the
//! ranked results into a bounded context block for generation.

pub mod context;
pub mod retriever;

pub use context::{InjectedContext, PREVIEW_CHARS, build_context, preview};
pub use retriever::Retriever;
