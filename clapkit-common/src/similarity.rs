//! Token-overlap similarity scoring
//!
//! Scores how much two text fragments share vocabulary, used by the shot
//! reconciler to match re-edited scenario lines back to prior shots. The
//! metric is a token-level Dice coefficient over normalized text: lowercase,
//! punctuation (`.` `,` `!` `?`) stripped, whitespace-tokenized.

/// Normalize a text fragment for matching.
///
/// Lowercases, strips sentence punctuation, and trims surrounding whitespace.
/// Inner whitespace is left alone so substring checks still line up.
pub(crate) fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '!' | '?'))
        .collect();
    stripped.trim().to_string()
}

/// Token-Dice similarity between two fragments, in [0.0, 1.0].
///
/// `2 * |overlap| / (|tokens_a| + |tokens_b|)`, where each token of `a`
/// counts toward the overlap when it occurs anywhere in `b` (repeats in `a`
/// count each time). Returns 0.0 when either side has no tokens.
pub(crate) fn token_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: Vec<String> = normalize(a).split_whitespace().map(str::to_string).collect();
    let tokens_b: Vec<String> = normalize(b).split_whitespace().map(str::to_string).collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let vocab_b: std::collections::HashSet<&str> =
        tokens_b.iter().map(String::as_str).collect();
    let overlap = tokens_a
        .iter()
        .filter(|t| vocab_b.contains(t.as_str()))
        .count();

    (2.0 * overlap as f64) / ((tokens_a.len() + tokens_b.len()) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_scores_one() {
        assert_eq!(token_similarity("a quiet street", "a quiet street"), 1.0);
    }

    #[test]
    fn test_symmetry_for_distinct_tokens() {
        let a = "the detective crosses the-room slowly";
        let b = "slowly she crosses toward him";
        assert_eq!(token_similarity(a, b), token_similarity(b, a));
    }

    #[test]
    fn test_disjoint_text_scores_zero() {
        assert_eq!(token_similarity("red balloon", "quiet harbor night"), 0.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(token_similarity("", "anything"), 0.0);
        assert_eq!(token_similarity("anything", ""), 0.0);
        // Punctuation-only input normalizes to nothing
        assert_eq!(token_similarity("...", "anything"), 0.0);
    }

    #[test]
    fn test_punctuation_and_case_ignored() {
        assert_eq!(
            token_similarity("She turns, and waits.", "she turns and waits"),
            1.0
        );
    }

    #[test]
    fn test_partial_overlap() {
        // overlap {a, b} of 2+3 tokens -> 2*2/5
        let score = token_similarity("a b", "a b c");
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_strips_and_trims() {
        assert_eq!(normalize("  Hello, World!  "), "hello world");
        assert_eq!(normalize("?!,."), "");
    }
}
