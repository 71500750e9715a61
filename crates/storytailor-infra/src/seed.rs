//! Default knowledge for a fresh knowledge base.
//!
//! Short, curated facts about children's storytelling themes and a few
//! nature facts. Loaded on demand by `GroundingService::seed_defaults`.

use storytailor_types::document::NewDocument;

const DEFAULT_KNOWLEDGE: &[(&str, &str)] = &[
    (
        "In children's stories, courage means doing the right thing even while feeling afraid. \
         It is important to show children that courage is not the absence of fear but acting \
         in spite of it.",
        "Child Education Principles",
    ),
    (
        "Friendship means understanding each other, helping in hard times, and sharing joy \
         together. Good friends respect and accept each other's differences.",
        "Child Development Psychology",
    ),
    (
        "Stories about nature and animals help children understand why ecosystems matter and \
         grow respect for all living things.",
        "Environmental Education Guide",
    ),
    (
        "A family's love is unconditional. The bond between parents and children is central \
         to a child's emotional security and self-esteem.",
        "Family Psychology",
    ),
    (
        "Failures and mistakes are chances to learn. Children should hear that it is okay to \
         fail and be encouraged to find the courage to try again.",
        "Growth Mindset Research",
    ),
    (
        "Rabbits can really run fast, reaching speeds of up to 70 km/h. A rabbit's long ears \
         help it hear predators and regulate its body temperature.",
        "Animal Encyclopedia",
    ),
    (
        "Many animals live together in the forest. Squirrels, foxes, deer and birds form an \
         ecosystem, and each animal plays an important role in the forest.",
        "Ecology Basics",
    ),
    (
        "In adventure stories the hero usually leaves home, explores a new world, overcomes \
         challenges and returns having grown. This is the structure known as the hero's journey.",
        "Narrative Structure Studies",
    ),
];

/// The default documents, in a stable order.
pub fn default_knowledge() -> Vec<NewDocument> {
    DEFAULT_KNOWLEDGE
        .iter()
        .map(|(text, source)| NewDocument::new(*text, *source))
        .collect()
}
