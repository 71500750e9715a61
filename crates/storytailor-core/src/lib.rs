//! Grounding logic and port definitions for StoryTailor.
//!
//! This crate defines the "ports" (embedder and story generator traits) that
//! the infrastructure layer implements, plus everything that only needs those
//! ports: the in-process knowledge store, retrieval, context injection, fact
//! checking, and the grounded story state machine. It depends only on
//! `storytailor-types` -- never on `storytailor-infra` or any network crate.

pub mod embedding;
pub mod knowledge;
pub mod retrieval;
pub mod story;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;
