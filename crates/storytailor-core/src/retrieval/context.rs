//! Context injection: format ranked documents into a bounded block.
//!
//! Each entry is `[source] text`; entries are joined by a newline. Sizes are
//! counted in characters, separators included. A document is either included
//! whole or not at all, and the first document that does not fit ends the
//! block even if a later, shorter one would.

use serde::Serialize;

use storytailor_types::document::RetrievalResult;

/// Characters kept by [`preview`].
pub const PREVIEW_CHARS: usize = 150;

const SEPARATOR: &str = "\n";

/// A context block ready to inject into a generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InjectedContext {
    pub context_block: String,
    /// Source labels of the included documents, deduplicated, first-seen order.
    pub used_sources: Vec<String>,
    pub documents_used: usize,
}

impl InjectedContext {
    /// True when nothing was injected and generation runs ungrounded.
    pub fn is_ungrounded(&self) -> bool {
        self.documents_used == 0
    }
}

pub fn build_context(results: &[RetrievalResult], max_chars: usize) -> InjectedContext {
    let mut context = InjectedContext::default();
    let mut used_chars = 0;

    for result in results {
        let doc = &result.document;
        let entry = format!("[{}] {}", doc.source, doc.text);
        let separator_chars = if context.documents_used == 0 {
            0
        } else {
            SEPARATOR.len()
        };
        let needed = separator_chars + entry.chars().count();

        if used_chars + needed > max_chars {
            tracing::debug!(
                included = context.documents_used,
                skipped = results.len() - context.documents_used,
                max_chars,
                "context budget reached"
            );
            break;
        }

        if separator_chars > 0 {
            context.context_block.push_str(SEPARATOR);
        }
        context.context_block.push_str(&entry);
        used_chars += needed;
        context.documents_used += 1;

        if !context.used_sources.contains(&doc.source) {
            context.used_sources.push(doc.source.clone());
        }
    }

    context
}

/// The first [`PREVIEW_CHARS`] characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use storytailor_types::document::{Document, DocumentId};

    fn result(text: &str, source: &str, score: f64) -> RetrievalResult {
        RetrievalResult {
            document: Arc::new(Document {
                id: DocumentId::new(),
                text: text.to_string(),
                source: source.to_string(),
                embedding: vec![1.0],
                added_at: Utc::now(),
            }),
            score,
        }
    }

    #[test]
    fn test_empty_results_are_ungrounded() {
        let ctx = build_context(&[], 1000);
        assert!(ctx.context_block.is_empty());
        assert!(ctx.used_sources.is_empty());
        assert!(ctx.is_ungrounded());
    }

    #[test]
    fn test_entries_are_prefixed_and_joined() {
        let ctx = build_context(
            &[
                result("Rabbits can run fast.", "Animal Encyclopedia", 0.9),
                result("Foxes live in forests.", "Forest Ecology", 0.8),
            ],
            1000,
        );
        assert_eq!(
            ctx.context_block,
            "[Animal Encyclopedia] Rabbits can run fast.\n[Forest Ecology] Foxes live in forests."
        );
        assert_eq!(ctx.used_sources, vec!["Animal Encyclopedia", "Forest Ecology"]);
        assert_eq!(ctx.documents_used, 2);
    }

    #[test]
    fn test_only_first_document_fits() {
        let first = result(&"a".repeat(40), "A", 0.9);
        let second = result(&"b".repeat(40), "B", 0.8);
        // "[A] " + 40 = 44 chars; the second entry would need 45 more.
        let ctx = build_context(&[first, second], 60);
        assert_eq!(ctx.documents_used, 1);
        assert_eq!(ctx.context_block, format!("[A] {}", "a".repeat(40)));
        assert_eq!(ctx.used_sources, vec!["A"]);
    }

    #[test]
    fn test_exact_fit_includes_separator() {
        let results = [result("xx", "A", 0.9), result("yy", "B", 0.8)];
        // "[A] xx" (6) + "\n" (1) + "[B] yy" (6) = 13
        assert_eq!(build_context(&results, 13).documents_used, 2);
        assert_eq!(build_context(&results, 12).documents_used, 1);
    }

    #[test]
    fn test_stops_at_first_document_that_does_not_fit() {
        let results = [
            result("short", "A", 0.9),
            result(&"long ".repeat(20), "B", 0.8),
            result("tiny", "C", 0.7),
        ];
        let ctx = build_context(&results, 30);
        assert_eq!(ctx.documents_used, 1);
        assert_eq!(ctx.used_sources, vec!["A"]);
    }

    #[test]
    fn test_first_document_too_large_yields_empty_block() {
        let ctx = build_context(&[result("far too long for the budget", "A", 0.9)], 5);
        assert!(ctx.is_ungrounded());
        assert!(ctx.used_sources.is_empty());
    }

    #[test]
    fn test_sources_deduplicated_in_first_seen_order() {
        let ctx = build_context(
            &[
                result("one", "Guide", 0.9),
                result("two", "Atlas", 0.8),
                result("three", "Guide", 0.7),
            ],
            1000,
        );
        assert_eq!(ctx.used_sources, vec!["Guide", "Atlas"]);
        assert_eq!(ctx.documents_used, 3);
    }

    #[test]
    fn test_budget_counts_characters() {
        // 4 + 10 two-byte characters = 14 chars, 24 bytes
        let ctx = build_context(&[result(&"é".repeat(10), "A", 0.9)], 14);
        assert_eq!(ctx.documents_used, 1);
    }

    #[test]
    fn test_preview_truncates_by_characters() {
        assert_eq!(preview("short"), "short");
        let long = "ü".repeat(200);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS);
    }
}
