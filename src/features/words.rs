//! Word feature extractor, the default for plain-text documents.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{ClassyError, Result};
use crate::features::stop::DEFAULT_ENGLISH_STOP_WORDS_SET;
use crate::features::{FeatureExtractor, Features};

/// Separators between words: anything that is not an ASCII letter or a hyphen.
pub const DEFAULT_SEPARATOR_PATTERN: &str = "[^A-Za-z-]+";

static DEFAULT_SEPARATOR: LazyLock<Arc<Regex>> = LazyLock::new(|| {
    Arc::new(Regex::new(DEFAULT_SEPARATOR_PATTERN).expect("default separator pattern is valid"))
});

/// Splits text into lowercased words and uses each distinct word as a
/// feature of weight `1.0`.
///
/// Words shorter than `min_len` or longer than `max_len` (3 and 19 by
/// default) are dropped, as are stop words.
///
/// # Examples
///
/// ```
/// use classy::features::FeatureExtractor;
/// use classy::features::words::WordExtractor;
///
/// let extractor = WordExtractor::default();
/// let features = extractor.features("Make quick money at the online casino").unwrap();
///
/// // "at" is too short, "the" is a stop word.
/// let words: Vec<_> = features.keys().map(String::as_str).collect();
/// assert_eq!(words, vec!["make", "quick", "money", "online", "casino"]);
/// ```
#[derive(Clone, Debug)]
pub struct WordExtractor {
    separator: Arc<Regex>,
    stop_words: Arc<HashSet<String>>,
    min_len: usize,
    max_len: usize,
}

impl WordExtractor {
    /// Create an extractor with the default separator and English stop words.
    pub fn new() -> Self {
        Self::with_stop_words(DEFAULT_ENGLISH_STOP_WORDS_SET.clone())
    }

    /// Create an extractor that keeps stop words.
    pub fn without_stop_words() -> Self {
        Self::with_stop_words(HashSet::new())
    }

    /// Create an extractor with a custom stop word set.
    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        WordExtractor {
            separator: Arc::clone(&DEFAULT_SEPARATOR),
            stop_words: Arc::new(stop_words),
            min_len: 3,
            max_len: 19,
        }
    }

    /// Replace the separator with a custom regex pattern.
    pub fn with_separator(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| ClassyError::features(format!("Invalid separator pattern: {e}")))?;
        self.separator = Arc::new(regex);
        Ok(self)
    }

    /// Set the accepted word length range (inclusive).
    pub fn with_length_range(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    /// Check if a (lowercased) word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Extract the features of a plain-text document.
    pub fn extract(&self, text: &str) -> Features {
        let mut features = Features::new();
        for word in self.separator.split(text) {
            let len = word.chars().count();
            if len < self.min_len || len > self.max_len {
                continue;
            }
            let word = word.to_lowercase();
            if self.is_stop_word(&word) {
                continue;
            }
            features.entry(word).or_insert(1.0);
        }
        features
    }
}

impl Default for WordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor<str> for WordExtractor {
    fn features(&self, document: &str) -> Result<Features> {
        Ok(self.extract(document))
    }

    fn name(&self) -> &'static str {
        "words"
    }
}
