//! Construction of classifiers from an [`Algorithm`].

use std::sync::Arc;

use log::debug;

use crate::classifier::{
    Algorithm, BaseClassifier, ClassifierOptions, Classify, Fisher, NaiveBayes,
};
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::features::words::WordExtractor;
use crate::store::CountStore;

/// A factory for creating classifier instances.
pub struct ClassifierFactory;

impl ClassifierFactory {
    /// Create a classifier whose store is selected by `options`.
    pub fn create<D: ?Sized + 'static>(
        algorithm: Algorithm,
        options: &ClassifierOptions,
        extractor: Arc<dyn FeatureExtractor<D>>,
    ) -> Result<Box<dyn Classify<D>>> {
        let base = BaseClassifier::with_options(options, extractor)?;
        Ok(Self::assemble(algorithm, base, options))
    }

    /// Create a classifier over an existing, possibly shared, store.
    pub fn create_with_store<D: ?Sized + 'static>(
        algorithm: Algorithm,
        store: Arc<dyn CountStore>,
        extractor: Arc<dyn FeatureExtractor<D>>,
        options: &ClassifierOptions,
    ) -> Result<Box<dyn Classify<D>>> {
        let mut base = BaseClassifier::new(store, extractor);
        for (category, assumed) in &options.assumed_probabilities {
            base.set_assumed_probability(category, *assumed);
        }
        Ok(Self::assemble(algorithm, base, options))
    }

    /// Create a plain-text classifier using the default [`WordExtractor`].
    pub fn create_text(
        algorithm: Algorithm,
        options: &ClassifierOptions,
    ) -> Result<Box<dyn Classify<str>>> {
        Self::create(algorithm, options, Arc::new(WordExtractor::default()))
    }

    fn assemble<D: ?Sized + 'static>(
        algorithm: Algorithm,
        base: BaseClassifier<D>,
        options: &ClassifierOptions,
    ) -> Box<dyn Classify<D>> {
        debug!(
            "creating {algorithm} classifier over {} store",
            base.store().store_type()
        );

        match algorithm {
            Algorithm::NaiveBayes => {
                let mut classifier = NaiveBayes::new(base);
                for (category, threshold) in &options.thresholds {
                    classifier.set_threshold(category, *threshold);
                }
                Box::new(classifier)
            }
            Algorithm::Fisher => {
                let mut classifier = Fisher::new(base);
                for (category, minimum) in &options.minimums {
                    classifier.set_minimum(category, *minimum);
                }
                Box::new(classifier)
            }
        }
    }
}
