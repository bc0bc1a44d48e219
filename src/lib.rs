//! # classy
//!
//! A trainable text classifier for Rust.
//!
//! ## Features
//!
//! - Naive Bayes and Fisher (chi-squared) classification
//! - In-memory or SQLite-persisted feature counts behind one store trait
//! - Pluggable feature extraction with a default word tokenizer
//! - Parallel batch classification on a worker pool
//!
//! ## Example
//!
//! ```
//! use classy::classifier::{Algorithm, ClassifierFactory, ClassifierOptions};
//!
//! # fn main() -> classy::error::Result<()> {
//! let classifier = ClassifierFactory::create_text(Algorithm::Fisher, &ClassifierOptions::default())?;
//! classifier.train("the quick rabbit jumps fances", "good")?;
//! classifier.train("make quick money at the online casino", "bad")?;
//!
//! assert_eq!(classifier.classify("online money", None)?, "bad");
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod cli;
pub mod error;
pub mod features;
pub mod pool;
pub mod store;

pub mod prelude {
    pub use crate::classifier::{
        Algorithm, BaseClassifier, ClassifierFactory, ClassifierOptions, Classify, Fisher,
        NaiveBayes,
    };
    pub use crate::error::{ClassyError, Result};
    pub use crate::features::{FeatureExtractor, Features};
    pub use crate::pool::{PoolConfig, WorkerPool};
    pub use crate::store::{CountStore, StoreConfig, StoreFactory};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
