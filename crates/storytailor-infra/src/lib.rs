//! Infrastructure layer for StoryTailor grounding.
//!
//! Implements the ports defined in `storytailor-core`: a local feature-hashing
//! embedder, an OpenAI-compatible HTTP embedder, and an OpenAI-compatible story
//! generator. Also owns configuration loading, snapshot files, the default
//! seed knowledge, and [`service::GroundingService`], which wires everything
//! together for the CLI.

pub mod config;
pub mod embedding;
pub mod generation;
pub mod seed;
pub mod service;
pub mod snapshot;
