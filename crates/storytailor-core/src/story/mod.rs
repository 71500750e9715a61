//! Grounded story generation.
//!
//! `StoryGenerator` is the port to the external text model, `StoryPromptBuilder`
//! assembles the prompts, and `StoryOrchestrator` runs the
//! retrieve / generate / verify state machine.

pub mod box_generator;
pub mod generator;
pub mod orchestrator;
pub mod prompt;

pub use box_generator::BoxStoryGenerator;
pub use generator::StoryGenerator;
pub use orchestrator::{OrchestratorOptions, StoryOrchestrator};
pub use prompt::{StoryPrompt, StoryPromptBuilder};
