//! Naive Bayes classifier.

use std::collections::HashMap;

use log::debug;

use crate::classifier::base::effective_weight;
use crate::classifier::{Algorithm, BaseClassifier, Classify};
use crate::error::Result;
use crate::features::Features;

/// Category returned by [`NaiveBayes::classify`] when no category wins.
pub const DEFAULT_CATEGORY: &str = "";

/// Threshold used for categories without an explicit setting.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Scores a document by multiplying the weighted probabilities of its
/// features and the category prior.
///
/// A category only wins when its probability is more than `threshold(best)`
/// times that of every other category.
///
/// # Examples
///
/// ```
/// use classy::classifier::{BaseClassifier, NaiveBayes};
///
/// # fn main() -> classy::error::Result<()> {
/// let mut classifier = NaiveBayes::new(BaseClassifier::default());
/// classifier.base().train("buy pharmaceuticals now", "bad")?;
/// classifier.base().train("the quick rabbit jumps fances", "good")?;
///
/// assert_eq!(classifier.classify("quick rabbit", "unknown")?, "good");
///
/// classifier.set_threshold("good", 1e6);
/// assert_eq!(classifier.classify("quick rabbit", "unknown")?, "unknown");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NaiveBayes<D: ?Sized> {
    base: BaseClassifier<D>,
    thresholds: HashMap<String, f64>,
}

impl<D: ?Sized> NaiveBayes<D> {
    pub fn new(base: BaseClassifier<D>) -> Self {
        NaiveBayes {
            base,
            thresholds: HashMap::new(),
        }
    }

    pub fn base(&self) -> &BaseClassifier<D> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseClassifier<D> {
        &mut self.base
    }

    /// Set the veto margin of a category.
    pub fn set_threshold(&mut self, category: &str, threshold: f64) {
        self.thresholds.insert(category.to_string(), threshold);
    }

    /// The veto margin of a category, 1.0 unless set.
    pub fn threshold(&self, category: &str) -> f64 {
        self.thresholds
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    /// Pr(document | category) for already extracted features.
    pub fn features_probability(&self, features: &Features, category: &str) -> Result<f64> {
        let fprob = |f: &str, c: &str| self.base.feature_probability(f, c);

        let mut probability = 1.0;
        for (feature, weight) in features {
            probability *=
                self.base
                    .weighted_probability(feature, category, effective_weight(*weight), fprob)?;
        }
        Ok(probability)
    }

    /// Pr(document | category).
    pub fn document_probability(&self, document: &D, category: &str) -> Result<f64> {
        let features = self.base.features(document)?;
        self.features_probability(&features, category)
    }

    /// Pr(category | document) up to a constant: the category prior times
    /// the document probability. `0` when nothing has been trained.
    pub fn probability(&self, document: &D, category: &str) -> Result<f64> {
        let features = self.base.features(document)?;
        self.category_probability(&features, category)
    }

    fn category_probability(&self, features: &Features, category: &str) -> Result<f64> {
        let total = self.base.total_count()?;
        if total == 0 {
            return Ok(0.0);
        }
        let prior = self.base.category_count(category)? as f64 / total as f64;
        Ok(prior * self.features_probability(features, category)?)
    }

    /// The most probable category, or `default` when none is dominant enough.
    pub fn classify(&self, document: &D, default: &str) -> Result<String> {
        let features = self.base.features(document)?;

        let mut scores = Vec::new();
        let mut best: Option<usize> = None;
        let mut max = 0.0;
        for category in self.base.categories()? {
            let probability = self.category_probability(&features, &category)?;
            if probability > max {
                max = probability;
                best = Some(scores.len());
            }
            scores.push((category, probability));
        }

        let Some(best) = best else {
            return Ok(default.to_string());
        };

        let threshold = self.threshold(&scores[best].0);
        for (index, (category, probability)) in scores.iter().enumerate() {
            if index != best && probability * threshold > max {
                debug!(
                    "'{}' is not dominant over '{category}', using default",
                    scores[best].0
                );
                return Ok(default.to_string());
            }
        }

        Ok(scores.swap_remove(best).0)
    }
}

impl<D: ?Sized> Classify<D> for NaiveBayes<D> {
    fn train(&self, document: &D, category: &str) -> Result<()> {
        self.base.train(document, category)
    }

    fn classify(&self, document: &D, default: Option<&str>) -> Result<String> {
        NaiveBayes::classify(self, document, default.unwrap_or(DEFAULT_CATEGORY))
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::NaiveBayes
    }

    fn base(&self) -> &BaseClassifier<D> {
        &self.base
    }
}
