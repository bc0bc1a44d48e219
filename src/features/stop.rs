//! Default stop word list.
//!
//! Common English words that carry no signal about a document's category.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Default English stop words.
pub const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Default English stop words as a HashSet.
pub static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<String>> = LazyLock::new(|| {
    DEFAULT_ENGLISH_STOP_WORDS
        .iter()
        .map(|&s| s.to_string())
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_matches_list() {
        assert_eq!(
            DEFAULT_ENGLISH_STOP_WORDS_SET.len(),
            DEFAULT_ENGLISH_STOP_WORDS.len()
        );
        assert!(DEFAULT_ENGLISH_STOP_WORDS_SET.contains("the"));
        assert!(!DEFAULT_ENGLISH_STOP_WORDS_SET.contains("quick"));
    }
}
