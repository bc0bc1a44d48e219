//! Count store abstraction for classy.
//!
//! This module exposes the counting substrate shared by every classification
//! algorithm: how many times each feature was seen per category, and how many
//! documents were trained per category. The in-memory and SQLite backends can
//! be swapped without touching the classifiers.
//!
//! # Architecture
//!
//! - **CountStore trait**: Unified interface for all count backends
//! - **StoreConfig enum**: Type-safe configuration for supported backends
//! - **StoreFactory**: Helper for constructing concrete store instances
//!
//! # Example
//!
//! ```
//! use classy::store::{CountStore, StoreConfig, StoreFactory};
//!
//! # fn main() -> classy::error::Result<()> {
//! let store = StoreFactory::create(StoreConfig::default())?;
//! store.increment_feature_category("quick", "good")?;
//! store.increment_category_count("good")?;
//!
//! assert_eq!(store.feature_category_count("quick", "good")?, 1);
//! assert_eq!(store.feature_category_count("quick", "bad")?, 0);
//! assert_eq!(store.total_document_count()?, 1);
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryCountStore, MemoryStoreConfig};
pub use sqlite::{SqliteCountStore, SqliteStoreConfig};

/// A store for feature×category counts and per-category document counts.
///
/// Every read of an absent entry returns `0`. Every mutation is applied as a
/// single serialized read-increment-write, so sequential or concurrent calls
/// for the same key never lose an increment.
pub trait CountStore: Send + Sync + Debug {
    /// Increment `count[feature][category]` by one, creating the entry if absent.
    fn increment_feature_category(&self, feature: &str, category: &str) -> Result<()>;

    /// Increment the document count of `category` by one, creating the entry if absent.
    fn increment_category_count(&self, category: &str) -> Result<()>;

    /// Number of trained documents of `category` that contained `feature`.
    fn feature_category_count(&self, feature: &str, category: &str) -> Result<u64>;

    /// Number of documents trained under `category`.
    fn category_document_count(&self, category: &str) -> Result<u64>;

    /// Sum of all category document counts; `0` on an empty store.
    fn total_document_count(&self) -> Result<u64>;

    /// All categories with a recorded document count, in first-trained order.
    fn categories(&self) -> Result<Vec<String>>;

    /// Record one trained document: one increment per feature, then one
    /// increment of the category count.
    ///
    /// Callers pass each distinct feature once.
    fn record_document(&self, features: &[String], category: &str) -> Result<()> {
        for feature in features {
            self.increment_feature_category(feature, category)?;
        }
        self.increment_category_count(category)
    }

    /// Release backend resources. Later operations fail with a storage error.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Get the name of this store type.
    fn store_type(&self) -> &'static str;
}

/// Configuration for count store backends.
///
/// Each variant carries the settings specific to that backend, including the
/// database path for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Transient in-memory counts
    Memory(MemoryStoreConfig),

    /// Counts persisted in a SQLite database file
    Sqlite(SqliteStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory(MemoryStoreConfig::default())
    }
}

impl StoreConfig {
    /// Pick the backend from an optional database path.
    ///
    /// A path that exists selects the SQLite backend; a missing path (or no
    /// path at all) selects the in-memory backend.
    pub fn from_db_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.exists() => StoreConfig::Sqlite(SqliteStoreConfig::new(path)),
            _ => StoreConfig::default(),
        }
    }
}

/// A factory for creating count store instances.
pub struct StoreFactory;

impl StoreFactory {
    /// Create a new count store with the given configuration.
    pub fn create(config: StoreConfig) -> Result<Arc<dyn CountStore>> {
        match config {
            StoreConfig::Memory(mem_config) => Ok(Arc::new(MemoryCountStore::new(mem_config))),
            StoreConfig::Sqlite(sqlite_config) => {
                Ok(Arc::new(SqliteCountStore::open(sqlite_config)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_default_is_memory() {
        assert!(matches!(StoreConfig::default(), StoreConfig::Memory(_)));
    }

    #[test]
    fn test_from_db_path() {
        assert!(matches!(
            StoreConfig::from_db_path(None),
            StoreConfig::Memory(_)
        ));
        assert!(matches!(
            StoreConfig::from_db_path(Some(Path::new("/definitely/not/here.db"))),
            StoreConfig::Memory(_)
        ));

        let file = tempfile::NamedTempFile::new().unwrap();
        match StoreConfig::from_db_path(Some(file.path())) {
            StoreConfig::Sqlite(config) => assert_eq!(config.path, file.path()),
            other => panic!("Expected sqlite config, got {other:?}"),
        }
    }

    #[test]
    fn test_factory_store_types() {
        let store = StoreFactory::create(StoreConfig::default()).unwrap();
        assert_eq!(store.store_type(), "memory");

        let file = tempfile::NamedTempFile::new().unwrap();
        let store = StoreFactory::create(StoreConfig::from_db_path(Some(file.path()))).unwrap();
        assert_eq!(store.store_type(), "sqlite");
    }

    #[test]
    fn test_record_document_default_impl() {
        let store = MemoryCountStore::default();
        let features = vec!["quick".to_string(), "rabbit".to_string()];
        store.record_document(&features, "good").unwrap();
        store.record_document(&features[..1], "good").unwrap();

        assert_eq!(store.feature_category_count("quick", "good").unwrap(), 2);
        assert_eq!(store.feature_category_count("rabbit", "good").unwrap(), 1);
        assert_eq!(store.category_document_count("good").unwrap(), 2);
    }
}
