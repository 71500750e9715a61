//! Shared domain types for StoryTailor grounding.
//!
//! This crate contains the types passed between the knowledge store, the
//! fact checker and the story orchestrator: documents and their snapshot
//! records, verification verdicts, story requests/results, configuration,
//! and the single error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod document;
pub mod error;
pub mod story;
pub mod verification;
