//! Training and the probability engine shared by every algorithm.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::classifier::ClassifierOptions;
use crate::error::Result;
use crate::features::words::WordExtractor;
use crate::features::{FeatureExtractor, Features};
use crate::store::{CountStore, MemoryCountStore, StoreFactory};

/// Assumed probability used for categories without an explicit setting.
pub const DEFAULT_ASSUMED_PROBABILITY: f64 = 0.5;

/// The weight a feature contributes to a category score.
///
/// Extractor weights must be positive and finite. Anything else (zero,
/// negative, infinite or NaN) counts as `1.0`, which keeps the denominator
/// of [`BaseClassifier::weighted_probability`] positive.
pub(crate) fn effective_weight(weight: f64) -> f64 {
    if weight > 0.0 && weight.is_finite() {
        weight
    } else {
        1.0
    }
}

/// Owns the count store handle and the feature extractor, trains documents
/// and computes the per-feature probabilities the algorithms combine.
///
/// # Examples
///
/// ```
/// use classy::classifier::BaseClassifier;
///
/// # fn main() -> classy::error::Result<()> {
/// let classifier = BaseClassifier::default();
/// classifier.train("the quick brown fox jumps over the lazy dog", "good")?;
/// classifier.train("make quick money in the online casino", "bad")?;
///
/// assert_eq!(classifier.feature_count("quick", "good")?, 1);
/// assert_eq!(classifier.feature_count("quick", "bad")?, 1);
/// assert_eq!(classifier.feature_probability("quick", "good")?, 1.0);
/// # Ok(())
/// # }
/// ```
pub struct BaseClassifier<D: ?Sized> {
    store: Arc<dyn CountStore>,
    extractor: Arc<dyn FeatureExtractor<D>>,
    assumed_probabilities: HashMap<String, f64>,
}

impl<D: ?Sized> fmt::Debug for BaseClassifier<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClassifier")
            .field("store", &self.store.store_type())
            .field("extractor", &self.extractor.name())
            .field("assumed_probabilities", &self.assumed_probabilities)
            .finish()
    }
}

impl<D: ?Sized> BaseClassifier<D> {
    /// Create a classifier over an existing store.
    pub fn new(store: Arc<dyn CountStore>, extractor: Arc<dyn FeatureExtractor<D>>) -> Self {
        BaseClassifier {
            store,
            extractor,
            assumed_probabilities: HashMap::new(),
        }
    }

    /// Open the store selected by `options` and apply its assumed probabilities.
    pub fn with_options(
        options: &ClassifierOptions,
        extractor: Arc<dyn FeatureExtractor<D>>,
    ) -> Result<Self> {
        let store = StoreFactory::create(options.store_config())?;
        let mut base = Self::new(store, extractor);
        for (category, assumed) in &options.assumed_probabilities {
            base.set_assumed_probability(category, *assumed);
        }
        Ok(base)
    }

    /// The count store shared with any other classifier built on it.
    pub fn store(&self) -> &Arc<dyn CountStore> {
        &self.store
    }

    /// Replace the feature extractor.
    pub fn set_extractor(&mut self, extractor: Arc<dyn FeatureExtractor<D>>) {
        self.extractor = extractor;
    }

    /// Extract the features of a document with the configured extractor.
    pub fn features(&self, document: &D) -> Result<Features> {
        self.extractor.features(document)
    }

    /// Set the assumed probability of a category.
    pub fn set_assumed_probability(&mut self, category: &str, assumed: f64) {
        self.assumed_probabilities
            .insert(category.to_string(), assumed);
    }

    /// The assumed probability of a category, 0.5 unless set.
    pub fn assumed_probability(&self, category: &str) -> f64 {
        self.assumed_probabilities
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_ASSUMED_PROBABILITY)
    }

    /// Train with a document labeled `category`.
    ///
    /// Every distinct feature is counted once, whatever its weight. Feature
    /// extraction runs before any count is touched, so an extraction failure
    /// leaves the store unchanged.
    pub fn train(&self, document: &D, category: &str) -> Result<()> {
        let features: Vec<String> = self.features(document)?.into_keys().collect();
        debug!(
            "training {} features under category '{category}'",
            features.len()
        );
        self.store.record_document(&features, category)
    }

    /// Number of times `feature` was trained under `category`.
    pub fn feature_count(&self, feature: &str, category: &str) -> Result<u64> {
        self.store.feature_category_count(feature, category)
    }

    /// Number of documents trained under `category`.
    pub fn category_count(&self, category: &str) -> Result<u64> {
        self.store.category_document_count(category)
    }

    /// Total number of trained documents.
    pub fn total_count(&self) -> Result<u64> {
        self.store.total_document_count()
    }

    /// Every trained category.
    pub fn categories(&self) -> Result<Vec<String>> {
        self.store.categories()
    }

    /// Pr(feature | category): the fraction of the category's documents that
    /// contain the feature. `0` for a category with no documents.
    pub fn feature_probability(&self, feature: &str, category: &str) -> Result<f64> {
        let documents = self.category_count(category)?;
        if documents == 0 {
            return Ok(0.0);
        }
        Ok(self.feature_count(feature, category)? as f64 / documents as f64)
    }

    /// The probability computed by `base` shrunk towards the category's
    /// assumed probability.
    ///
    /// `weight` is how many observations the assumed probability is worth;
    /// the more often the feature was seen across all categories, the closer
    /// the result gets to `base(feature, category)`.
    pub fn weighted_probability<F>(
        &self,
        feature: &str,
        category: &str,
        weight: f64,
        base: F,
    ) -> Result<f64>
    where
        F: Fn(&str, &str) -> Result<f64>,
    {
        let basic = base(feature, category)?;

        let mut totals = 0u64;
        for cat in self.categories()? {
            totals += self.feature_count(feature, &cat)?;
        }
        let totals = totals as f64;

        let assumed = self.assumed_probability(category);
        Ok(((weight * assumed) + totals * basic) / (weight + totals))
    }

    /// Close the count store.
    pub fn close(&self) -> Result<()> {
        self.store.close()
    }
}

impl Default for BaseClassifier<str> {
    /// In-memory counts with the default word extractor.
    fn default() -> Self {
        Self::new(
            Arc::new(MemoryCountStore::default()),
            Arc::new(WordExtractor::default()),
        )
    }
}
