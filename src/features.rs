//! Feature extraction for classification.
//!
//! A feature extractor turns a document into an ordered mapping from feature
//! to weight. Training only looks at which features are present; the
//! classifiers use the weights when combining per-feature probabilities.
//!
//! # Available Extractors
//!
//! - [`words::WordExtractor`] - Lowercased alphabetic words with stop words removed
//! - [`json::JsonTextExtractor`] - Applies a text extractor to the strings of a JSON value
//!
//! # Examples
//!
//! ```
//! use classy::features::FeatureExtractor;
//! use classy::features::words::WordExtractor;
//!
//! let extractor = WordExtractor::default();
//! let features = extractor.features("The quick brown fox").unwrap();
//!
//! let words: Vec<_> = features.keys().map(String::as_str).collect();
//! assert_eq!(words, vec!["quick", "brown", "fox"]);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ClassyError, Result};

pub mod json;
pub mod stop;
pub mod words;

use json::JsonTextExtractor;
use words::WordExtractor;

/// Feature -> weight, in the order the features were first seen.
pub type Features = IndexMap<String, f64>;

/// Trait for functions that extract weighted features from a document.
///
/// Implementations must be pure: the same document always yields the same
/// features.
pub trait FeatureExtractor<D: ?Sized>: Send + Sync {
    /// Extract the features of `document`.
    fn features(&self, document: &D) -> Result<Features>;

    /// Get the name of this extractor (for logging and the worker registry).
    fn name(&self) -> &'static str;
}

impl<D: ?Sized, F> FeatureExtractor<D> for F
where
    F: Fn(&D) -> Result<Features> + Send + Sync,
{
    fn features(&self, document: &D) -> Result<Features> {
        self(document)
    }

    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Names accepted by [`by_name`].
pub const BUILTIN_EXTRACTORS: &[&str] = &["getWords", "words", "allWords"];

/// Look up a built-in extractor for JSON documents by name.
///
/// - `getWords` / `words`: [`WordExtractor::default`]
/// - `allWords`: [`WordExtractor::without_stop_words`]
pub fn by_name(name: &str) -> Option<Arc<dyn FeatureExtractor<Value>>> {
    match name {
        "getWords" | "words" => Some(Arc::new(JsonTextExtractor::new(WordExtractor::default()))),
        "allWords" => Some(Arc::new(JsonTextExtractor::new(
            WordExtractor::without_stop_words(),
        ))),
        _ => None,
    }
}

/// Like [`by_name`], but unknown names are an error.
pub fn resolve(name: &str) -> Result<Arc<dyn FeatureExtractor<Value>>> {
    by_name(name).ok_or_else(|| {
        ClassyError::features(format!(
            "unknown feature function '{name}' (expected one of: {})",
            BUILTIN_EXTRACTORS.join(", ")
        ))
    })
}
