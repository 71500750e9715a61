//! Claim extraction from generated stories.
//!
//! A claim is a sentence: text ending in `.`, `!` or `?` followed by
//! whitespace or end of input, or a line. Fragments under three words
//! (dialogue tags, "The end.") are not worth checking.

use std::collections::HashSet;

const MIN_CLAIM_WORDS: usize = 3;

/// Up to `max_claims` distinct sentences from `text`, in order of appearance.
///
/// Sentences longer than `max_chars` characters are skipped rather than
/// truncated, since the fact checker would reject them.
pub fn extract_claims(text: &str, max_claims: usize, max_chars: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut claims = Vec::new();

    for sentence in split_sentences(text) {
        if claims.len() >= max_claims {
            break;
        }
        if sentence.split_whitespace().count() < MIN_CLAIM_WORDS {
            continue;
        }
        if sentence.chars().count() > max_chars {
            tracing::debug!(chars = sentence.chars().count(), max_chars, "skipping long claim");
            continue;
        }
        if seen.insert(sentence.to_lowercase()) {
            claims.push(sentence.to_string());
        }
    }

    claims
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let at_boundary = match chars.peek() {
                None => true,
                Some((_, next)) => next.is_whitespace(),
            };
            if at_boundary {
                let end = i + c.len_utf8();
                push_trimmed(&mut sentences, &line[start..end]);
                start = end;
            }
        }
        push_trimmed(&mut sentences, &line[start..]);
    }

    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let claims = extract_claims(
            "Rabbits can run very fast. Do foxes live in forests? Yes they really do!",
            10,
            500,
        );
        assert_eq!(
            claims,
            vec![
                "Rabbits can run very fast.",
                "Do foxes live in forests?",
                "Yes they really do!",
            ]
        );
    }

    #[test]
    fn test_decimal_points_do_not_split() {
        let claims = extract_claims("The whale was 29.9 meters long.", 10, 500);
        assert_eq!(claims, vec!["The whale was 29.9 meters long."]);
    }

    #[test]
    fn test_lines_are_separate_sentences() {
        let claims = extract_claims("Once upon a time\nthere lived a brave rabbit", 10, 500);
        assert_eq!(claims, vec!["Once upon a time", "there lived a brave rabbit"]);
    }

    #[test]
    fn test_short_fragments_skipped() {
        let claims = extract_claims("The end. Hello! Rabbits eat fresh carrots.", 10, 500);
        assert_eq!(claims, vec!["Rabbits eat fresh carrots."]);
    }

    #[test]
    fn test_duplicates_removed_case_insensitively() {
        let claims = extract_claims("Rabbits are fast. rabbits are fast. Whales are big.", 10, 500);
        assert_eq!(claims, vec!["Rabbits are fast.", "Whales are big."]);
    }

    #[test]
    fn test_limits_number_of_claims() {
        let text = "One two three. Four five six. Seven eight nine.";
        assert_eq!(extract_claims(text, 2, 500).len(), 2);
        assert!(extract_claims(text, 0, 500).is_empty());
    }

    #[test]
    fn test_long_sentences_skipped() {
        let long = format!("{} end.", "word ".repeat(30));
        let text = format!("{long} Rabbits can run fast.");
        assert_eq!(extract_claims(&text, 5, 40), vec!["Rabbits can run fast."]);
    }

    #[test]
    fn test_empty_text_has_no_claims() {
        assert!(extract_claims("", 5, 500).is_empty());
        assert!(extract_claims("  \n\n ", 5, 500).is_empty());
    }
}
