//! In-memory count store for tests and transient classifiers.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ClassyError, Result};
use crate::store::CountStore;

/// Configuration for the in-memory count store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryStoreConfig {
    /// Number of features to reserve space for up front.
    pub initial_capacity: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// feature -> category -> count
    feature_x_category: IndexMap<String, IndexMap<String, u64>>,
    /// category -> trained documents
    category_count: IndexMap<String, u64>,
}

/// An in-memory count store.
///
/// All counts live behind a single lock; every mutation holds the write lock
/// for its whole read-increment-write, which serializes concurrent training.
#[derive(Debug)]
pub struct MemoryCountStore {
    state: RwLock<MemoryState>,
    closed: AtomicBool,
}

impl MemoryCountStore {
    /// Create a new memory store.
    pub fn new(config: MemoryStoreConfig) -> Self {
        let state = MemoryState {
            feature_x_category: IndexMap::with_capacity(config.initial_capacity),
            category_count: IndexMap::new(),
        };
        MemoryCountStore {
            state: RwLock::new(state),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of distinct features observed so far.
    pub fn feature_count(&self) -> usize {
        self.state.read().feature_x_category.len()
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ClassyError::store_closed())
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryCountStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}

impl CountStore for MemoryCountStore {
    fn increment_feature_category(&self, feature: &str, category: &str) -> Result<()> {
        self.check_closed()?;

        let mut state = self.state.write();
        let categories = state
            .feature_x_category
            .entry(feature.to_string())
            .or_default();
        *categories.entry(category.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn increment_category_count(&self, category: &str) -> Result<()> {
        self.check_closed()?;

        let mut state = self.state.write();
        *state.category_count.entry(category.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn feature_category_count(&self, feature: &str, category: &str) -> Result<u64> {
        self.check_closed()?;

        let state = self.state.read();
        Ok(state
            .feature_x_category
            .get(feature)
            .and_then(|categories| categories.get(category))
            .copied()
            .unwrap_or(0))
    }

    fn category_document_count(&self, category: &str) -> Result<u64> {
        self.check_closed()?;

        Ok(self
            .state
            .read()
            .category_count
            .get(category)
            .copied()
            .unwrap_or(0))
    }

    fn total_document_count(&self) -> Result<u64> {
        self.check_closed()?;

        Ok(self.state.read().category_count.values().sum())
    }

    fn categories(&self) -> Result<Vec<String>> {
        self.check_closed()?;

        Ok(self.state.read().category_count.keys().cloned().collect())
    }

    fn record_document(&self, features: &[String], category: &str) -> Result<()> {
        self.check_closed()?;

        // Readers never observe a partially recorded document.
        let mut state = self.state.write();
        for feature in features {
            let categories = state
                .feature_x_category
                .entry(feature.clone())
                .or_default();
            *categories.entry(category.to_string()).or_insert(0) += 1;
        }
        *state.category_count.entry(category.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_empty_store_reads_zero() {
        let store = MemoryCountStore::default();

        assert_eq!(store.feature_category_count("quick", "good").unwrap(), 0);
        assert_eq!(store.category_document_count("good").unwrap(), 0);
        assert_eq!(store.total_document_count().unwrap(), 0);
        assert!(store.categories().unwrap().is_empty());
    }

    #[test]
    fn test_increments_accumulate() {
        let store = MemoryCountStore::default();

        store.increment_feature_category("quick", "good").unwrap();
        store.increment_feature_category("quick", "good").unwrap();
        store.increment_feature_category("quick", "bad").unwrap();

        assert_eq!(store.feature_category_count("quick", "good").unwrap(), 2);
        assert_eq!(store.feature_category_count("quick", "bad").unwrap(), 1);
        assert_eq!(store.feature_count(), 1);
    }

    #[test]
    fn test_categories_in_first_trained_order() {
        let store = MemoryCountStore::default();

        store.increment_category_count("good").unwrap();
        store.increment_category_count("bad").unwrap();
        store.increment_category_count("good").unwrap();

        assert_eq!(store.categories().unwrap(), vec!["good", "bad"]);
        assert_eq!(store.category_document_count("good").unwrap(), 2);
        assert_eq!(store.total_document_count().unwrap(), 3);
    }

    #[test]
    fn test_feature_counts_do_not_register_categories() {
        let store = MemoryCountStore::default();
        store.increment_feature_category("quick", "good").unwrap();

        assert!(store.categories().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryCountStore::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..250 {
                        store.increment_feature_category("quick", "good").unwrap();
                        store.increment_category_count("good").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.feature_category_count("quick", "good").unwrap(), 2000);
        assert_eq!(store.category_document_count("good").unwrap(), 2000);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let store = MemoryCountStore::default();
        store.increment_category_count("good").unwrap();
        store.close().unwrap();

        assert!(matches!(
            store.category_document_count("good"),
            Err(ClassyError::Storage(_))
        ));
        assert!(store.increment_category_count("good").is_err());
        // Closing twice is fine.
        store.close().unwrap();
    }
}
