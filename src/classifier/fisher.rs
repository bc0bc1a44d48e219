//! Fisher's method classifier.
//!
//! Each feature contributes the probability that a document containing it
//! belongs to a category, normalised across categories. The probabilities are
//! combined with Fisher's method: `-2 ln(Π p)` follows a chi-squared
//! distribution with `2n` degrees of freedom when the probabilities are
//! independent and uniform, so its survival function is a confidence score in
//! `[0, 1]`.

use std::collections::HashMap;

use log::debug;

use crate::classifier::base::effective_weight;
use crate::classifier::{Algorithm, BaseClassifier, Classify};
use crate::error::Result;
use crate::features::Features;

/// Category returned by [`Fisher::classify`] when no category qualifies.
pub const DEFAULT_CATEGORY: &str = "unknown";

/// Minimum used for categories without an explicit setting.
pub const DEFAULT_MINIMUM: f64 = 0.0;

/// Survival function of the chi-squared distribution for even degrees of
/// freedom, capped at `1.0`.
///
/// A non-finite `chi` (the log of a zero product) yields `0.0`.
pub fn inverse_chi_square(chi: f64, df: usize) -> f64 {
    if !chi.is_finite() {
        return 0.0;
    }

    let m = chi / 2.0;
    let mut sum = (-m).exp();
    let mut term = sum;
    for i in 1..=df / 2 {
        term *= m / i as f64;
        sum += term;
    }
    sum.min(1.0)
}

/// Classifies with Fisher's method, accepting a category only when its score
/// is above the category's minimum.
///
/// # Examples
///
/// ```
/// use classy::classifier::{BaseClassifier, Fisher};
///
/// # fn main() -> classy::error::Result<()> {
/// let mut classifier = Fisher::new(BaseClassifier::default());
/// classifier.base().train("buy pharmaceuticals now", "bad")?;
/// classifier.base().train("the quick rabbit jumps fances", "good")?;
///
/// assert_eq!(classifier.classify("quick rabbit", "unknown")?, "good");
///
/// classifier.set_minimum("good", 1.0);
/// classifier.set_minimum("bad", 1.0);
/// assert_eq!(classifier.classify("quick rabbit", "unknown")?, "unknown");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Fisher<D: ?Sized> {
    base: BaseClassifier<D>,
    minimums: HashMap<String, f64>,
}

impl<D: ?Sized> Fisher<D> {
    pub fn new(base: BaseClassifier<D>) -> Self {
        Fisher {
            base,
            minimums: HashMap::new(),
        }
    }

    pub fn base(&self) -> &BaseClassifier<D> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseClassifier<D> {
        &mut self.base
    }

    /// Set the score a category must exceed to be chosen.
    pub fn set_minimum(&mut self, category: &str, minimum: f64) {
        self.minimums.insert(category.to_string(), minimum);
    }

    /// The minimum of a category, 0.0 unless set.
    pub fn minimum(&self, category: &str) -> f64 {
        self.minimums
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_MINIMUM)
    }

    /// Pr(category | feature): the feature probability in `category` over
    /// the sum of its feature probabilities in every category.
    pub fn category_probability(&self, feature: &str, category: &str) -> Result<f64> {
        let frequency = self.base.feature_probability(feature, category)?;
        if frequency == 0.0 {
            return Ok(0.0);
        }

        let mut frequency_sum = 0.0;
        for cat in self.base.categories()? {
            frequency_sum += self.base.feature_probability(feature, &cat)?;
        }
        Ok(frequency / frequency_sum)
    }

    /// Fisher score of already extracted features for `category`.
    pub fn fisher_probability(&self, features: &Features, category: &str) -> Result<f64> {
        let cprob = |f: &str, c: &str| self.category_probability(f, c);

        let mut product = 1.0f64;
        for (feature, weight) in features {
            product *=
                self.base
                    .weighted_probability(feature, category, effective_weight(*weight), cprob)?;
        }

        let score = -2.0 * product.ln();
        Ok(inverse_chi_square(score, features.len() * 2))
    }

    /// Fisher score of a document for `category`.
    pub fn document_probability(&self, document: &D, category: &str) -> Result<f64> {
        let features = self.base.features(document)?;
        self.fisher_probability(&features, category)
    }

    /// The highest scoring category above its minimum, or `default`.
    pub fn classify(&self, document: &D, default: &str) -> Result<String> {
        let features = self.base.features(document)?;

        let mut best = None;
        let mut max = 0.0;
        for category in self.base.categories()? {
            let probability = self.fisher_probability(&features, &category)?;
            let minimum = self.minimum(&category);
            if probability <= minimum {
                debug!("'{category}' scored {probability}, not above its minimum {minimum}");
                continue;
            }
            if probability > max {
                max = probability;
                best = Some(category);
            }
        }

        Ok(best.unwrap_or_else(|| default.to_string()))
    }
}

impl<D: ?Sized> Classify<D> for Fisher<D> {
    fn train(&self, document: &D, category: &str) -> Result<()> {
        self.base.train(document, category)
    }

    fn classify(&self, document: &D, default: Option<&str>) -> Result<String> {
        Fisher::classify(self, document, default.unwrap_or(DEFAULT_CATEGORY))
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Fisher
    }

    fn base(&self) -> &BaseClassifier<D> {
        &self.base
    }
}
