//! Prompt assembly for story generation.
//!
//! Grounded prompts carry the injected context inside a
//! `<reference_facts>` block with instructions to stay within it; ungrounded
//! prompts only carry the age-appropriateness guidelines.

use serde::Serialize;

use storytailor_types::story::StoryConstraints;

use crate::retrieval::InjectedContext;

const DEFAULT_LEARNING_GOAL: &str = "A fun and educational story";

/// System and user messages for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryPrompt {
    pub system: String,
    pub user: String,
}

pub struct StoryPromptBuilder;

impl StoryPromptBuilder {
    /// Prompt for a request with retrieved facts.
    ///
    /// Falls back to [`ungrounded`](Self::ungrounded) when the context is
    /// empty, so the model is never told to rely on facts it was not given.
    pub fn grounded(constraints: &StoryConstraints, query: &str, context: &InjectedContext) -> StoryPrompt {
        if context.is_ungrounded() {
            return Self::ungrounded(constraints, query);
        }

        let age = constraints.age;
        let system = format!(
            "You are a children's story writer for {age}-year-old children.\n\
            Build the story on the reference facts below.\n\n\
            <reference_facts>\n{}\n</reference_facts>\n\n\
            <guidelines>\n\
            1. Only use facts that appear in the reference facts.\n\
            2. Leave out anything you are not sure about.\n\
            3. Use vocabulary and sentence length suited to a {age}-year-old{}.\n\
            4. Avoid violent or scary content.\n\
            5. Include a positive message or lesson.\n\
            </guidelines>",
            context.context_block,
            reading_level_note(constraints),
        );

        let user = format!(
            "{}\n\nWrite a short story on this topic. Weave the reference facts in naturally.",
            Self::request_lines(constraints, query)
        );

        StoryPrompt { system, user }
    }

    /// Prompt for a request generated without retrieved facts.
    pub fn ungrounded(constraints: &StoryConstraints, query: &str) -> StoryPrompt {
        let system = format!(
            "You are a children's story writer for {}-year-old children.\n\
            Use vocabulary and sentence length appropriate for the child's age{}.\n\
            Avoid violent or scary content and include positive messages.",
            constraints.age,
            reading_level_note(constraints),
        );
        let user = format!(
            "{}\n\nPlease write a short story on the topic above.",
            Self::request_lines(constraints, query)
        );
        StoryPrompt { system, user }
    }

    fn request_lines(constraints: &StoryConstraints, query: &str) -> String {
        let topic = if constraints.preferences.is_empty() {
            query.to_string()
        } else {
            constraints.preferences.join(", ")
        };
        let goal = constraints
            .learning_goal
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_LEARNING_GOAL);
        format!("Topic: {topic}\nLearning goal: {goal}")
    }
}

fn reading_level_note(constraints: &StoryConstraints) -> String {
    constraints
        .reading_level
        .map(|level| format!(" (reading level {level})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> StoryConstraints {
        StoryConstraints {
            age: 6,
            reading_level: None,
            preferences: vec!["rabbit".to_string(), "forest".to_string()],
            learning_goal: Some("courage".to_string()),
        }
    }

    fn context() -> InjectedContext {
        InjectedContext {
            context_block: "[Animal Encyclopedia] Rabbits can run up to 70 km/h.".to_string(),
            used_sources: vec!["Animal Encyclopedia".to_string()],
            documents_used: 1,
        }
    }

    #[test]
    fn test_grounded_prompt_embeds_reference_facts() {
        let p = StoryPromptBuilder::grounded(&constraints(), "rabbit forest courage", &context());
        assert!(p.system.contains("<reference_facts>\n[Animal Encyclopedia] Rabbits can run up to 70 km/h.\n</reference_facts>"));
        assert!(p.system.contains("6-year-old"));
        assert!(p.user.contains("Topic: rabbit, forest"));
        assert!(p.user.contains("Learning goal: courage"));
    }

    #[test]
    fn test_empty_context_builds_ungrounded_prompt() {
        let c = constraints();
        let p = StoryPromptBuilder::grounded(&c, "q", &InjectedContext::default());
        assert_eq!(p, StoryPromptBuilder::ungrounded(&c, "q"));
        assert!(!p.system.contains("reference_facts"));
    }

    #[test]
    fn test_topic_falls_back_to_query_and_default_goal() {
        let c = StoryConstraints {
            age: 4,
            reading_level: Some(2),
            preferences: Vec::new(),
            learning_goal: None,
        };
        let p = StoryPromptBuilder::ungrounded(&c, "fun adventure");
        assert!(p.user.contains("Topic: fun adventure"));
        assert!(p.user.contains("Learning goal: A fun and educational story"));
        assert!(p.system.contains("(reading level 2)"));
    }
}
