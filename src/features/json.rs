//! Feature extraction for JSON documents.
//!
//! The worker CLI receives documents as JSON. A JSON string is handed to the
//! wrapped text extractor as-is; for objects and arrays every nested string
//! value is collected (in document order) and joined with spaces first.

use serde_json::Value;

use crate::error::Result;
use crate::features::{FeatureExtractor, Features};

/// Adapts a plain-text extractor to JSON documents.
#[derive(Clone, Debug)]
pub struct JsonTextExtractor<E> {
    inner: E,
}

impl<E> JsonTextExtractor<E> {
    /// Wrap a text extractor.
    pub fn new(inner: E) -> Self {
        JsonTextExtractor { inner }
    }

    /// Get the wrapped text extractor.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

/// Collect the text of every string in `value`, depth first.
pub fn collect_text(value: &Value) -> String {
    fn walk<'a>(value: &'a Value, parts: &mut Vec<&'a str>) {
        match value {
            Value::String(s) => parts.push(s),
            Value::Array(items) => items.iter().for_each(|item| walk(item, parts)),
            Value::Object(map) => map.values().for_each(|item| walk(item, parts)),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    let mut parts = Vec::new();
    walk(value, &mut parts);
    parts.join(" ")
}

impl<E> FeatureExtractor<Value> for JsonTextExtractor<E>
where
    E: FeatureExtractor<str>,
{
    fn features(&self, document: &Value) -> Result<Features> {
        match document {
            Value::String(text) => self.inner.features(text),
            other => self.inner.features(&collect_text(other)),
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::features::words::WordExtractor;

    #[test]
    fn test_string_document() {
        let extractor = JsonTextExtractor::new(WordExtractor::default());
        let features = extractor.features(&json!("quick rabbit")).unwrap();

        let words: Vec<_> = features.keys().map(String::as_str).collect();
        assert_eq!(words, vec!["quick", "rabbit"]);
    }

    #[test]
    fn test_nested_document() {
        let doc = json!({
            "metadata": ["pharmaceuticals", "online"],
            "content": { "body": "buy now" },
            "id": 212111,
            "draft": false
        });

        assert_eq!(collect_text(&doc), "pharmaceuticals online buy now");

        let extractor = JsonTextExtractor::new(WordExtractor::default());
        let features = extractor.features(&doc).unwrap();
        assert_eq!(features.len(), 4);
        assert!(features.contains_key("buy"));
    }

    #[test]
    fn test_non_text_document() {
        let extractor = JsonTextExtractor::new(WordExtractor::default());

        assert!(extractor.features(&json!(42)).unwrap().is_empty());
        assert!(extractor.features(&Value::Null).unwrap().is_empty());
        assert_eq!(extractor.name(), "words");
        assert!(extractor.inner().is_stop_word("the"));
    }
}
