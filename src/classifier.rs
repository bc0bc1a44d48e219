//! Document classifiers built on a shared count store.
//!
//! Two algorithms are provided, both composed from the same
//! [`BaseClassifier`] probability engine:
//!
//! - [`NaiveBayes`] multiplies per-feature probabilities and applies the
//!   category prior, vetoed by per-category thresholds.
//! - [`Fisher`] combines per-feature probabilities with Fisher's
//!   chi-squared method, gated by per-category minimums.
//!
//! [`ClassifierFactory`] picks the implementation from an [`Algorithm`].
//!
//! # Examples
//!
//! ```
//! use classy::classifier::{Algorithm, ClassifierFactory, ClassifierOptions};
//!
//! # fn main() -> classy::error::Result<()> {
//! let classifier = ClassifierFactory::create_text(Algorithm::NaiveBayes, &ClassifierOptions::default())?;
//! classifier.train("buy pharmaceuticals now", "bad")?;
//! classifier.train("the quick brown fox jumps", "good")?;
//!
//! assert_eq!(classifier.classify("quick fox", None)?, "good");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ClassyError, Result};
use crate::store::{SqliteStoreConfig, StoreConfig};

pub mod base;
pub mod factory;
pub mod fisher;
pub mod naive_bayes;

pub use base::BaseClassifier;
pub use factory::ClassifierFactory;
pub use fisher::Fisher;
pub use naive_bayes::NaiveBayes;

/// The classification capability shared by every algorithm.
pub trait Classify<D: ?Sized>: Send + Sync {
    /// Train the classifier with a document labeled `category`.
    fn train(&self, document: &D, category: &str) -> Result<()>;

    /// Pick the most likely category for `document`.
    ///
    /// Returns `default` (or the algorithm's own default when `None`) when no
    /// category is confident enough. This is never an error.
    fn classify(&self, document: &D, default: Option<&str>) -> Result<String>;

    /// The algorithm implemented by this classifier.
    fn algorithm(&self) -> Algorithm;

    /// The shared probability engine.
    fn base(&self) -> &BaseClassifier<D>;

    /// Close the underlying count store.
    fn close(&self) -> Result<()> {
        self.base().close()
    }
}

/// Available classification algorithms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Algorithm {
    /// Naive Bayes with category priors and thresholds
    #[default]
    #[value(name = "NaiveBayes", alias = "naive-bayes")]
    NaiveBayes,

    /// Fisher's method with per-category minimums
    #[value(name = "Fisher")]
    Fisher,
}

impl Algorithm {
    /// The canonical name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::NaiveBayes => "NaiveBayes",
            Algorithm::Fisher => "Fisher",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ClassyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "naivebayes" | "naive-bayes" | "naive_bayes" => Ok(Algorithm::NaiveBayes),
            "fisher" => Ok(Algorithm::Fisher),
            _ => Err(ClassyError::invalid_argument(format!(
                "unknown algorithm '{s}' (expected NaiveBayes or Fisher)"
            ))),
        }
    }
}

/// Where the persisted counts live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOptions {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,

    /// Create the file when it does not exist instead of falling back to memory.
    #[serde(default)]
    pub create_if_missing: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

/// Construction options for classifiers.
///
/// The feature extractor is code rather than data, so it is passed to the
/// factory separately.
///
/// ```
/// use classy::classifier::ClassifierOptions;
///
/// let options = ClassifierOptions::from_json_str(
///     r#"{ "database": { "dbPath": "train.db" }, "thresholds": { "bad": 3.0 } }"#,
/// ).unwrap();
/// assert_eq!(options.thresholds["bad"], 3.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierOptions {
    /// Persisted store location; absent means in-memory counts.
    pub database: Option<DatabaseOptions>,

    /// Per-category assumed probability (default 0.5).
    pub assumed_probabilities: HashMap<String, f64>,

    /// Per-category Naive Bayes thresholds (default 1.0).
    pub thresholds: HashMap<String, f64>,

    /// Per-category Fisher minimums (default 0.0).
    pub minimums: HashMap<String, f64>,
}

impl ClassifierOptions {
    /// Options that persist counts in the database at `path`.
    pub fn with_db_path<P: AsRef<Path>>(path: P) -> Self {
        ClassifierOptions {
            database: Some(DatabaseOptions {
                db_path: path.as_ref().to_path_buf(),
                create_if_missing: false,
                busy_timeout_ms: None,
            }),
            ..Default::default()
        }
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Allow the database file to be created.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        if let Some(database) = self.database.as_mut() {
            database.create_if_missing = create;
        }
        self
    }

    /// Resolve which count store backend these options select.
    ///
    /// A database path is used when the file exists or may be created;
    /// otherwise the counts are kept in memory.
    pub fn store_config(&self) -> StoreConfig {
        let Some(database) = &self.database else {
            return StoreConfig::default();
        };

        if !database.create_if_missing && !database.db_path.exists() {
            warn!(
                "database {} does not exist, using in-memory counts",
                database.db_path.display()
            );
            return StoreConfig::default();
        }

        let mut config =
            SqliteStoreConfig::new(&database.db_path).create_if_missing(database.create_if_missing);
        if let Some(timeout) = database.busy_timeout_ms {
            config.busy_timeout_ms = timeout;
        }
        StoreConfig::Sqlite(config)
    }
}
