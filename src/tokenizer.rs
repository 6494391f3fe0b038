//! Deterministic tokenizer shared by indexing and query paths.
//!
//! There is exactly one tokenization scheme in this crate: ASCII-lowercase,
//! split on any run of non-word characters, empty pieces discarded. No
//! pluggable tokenizer registry is offered; the same function indexes text
//! and parses queries, so postings and query terms are always comparable.

/// Tokenize `text` into an ordered sequence of lowercase tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn folds_whitespace_and_hyphens() {
        assert_eq!(tokenize("HELLO-world"), vec!["hello", "world"]);
    }

    #[test]
    fn empty_string_tokenizes_to_nothing() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn underscores_are_word_characters() {
        assert_eq!(tokenize("foo_bar baz"), vec!["foo_bar", "baz"]);
    }

    #[test]
    fn discards_runs_of_separators() {
        assert_eq!(tokenize("  alpha   beta  "), vec!["alpha", "beta"]);
    }
}
