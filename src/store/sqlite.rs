//! SQLite-backed count store.
//!
//! Counts are persisted in two tables:
//!
//! ```text
//! features_x_category(feature, category, count)
//! category_count(category, count)
//! ```
//!
//! Every increment looks up the current row and then inserts or updates it
//! inside a `BEGIN IMMEDIATE` transaction. The connection is guarded by a
//! mutex, so increments are serialized inside the process, and the immediate
//! transaction takes the database write lock, which serializes increments
//! across processes sharing the same file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::{Deserialize, Serialize};

use crate::error::{ClassyError, Result};
use crate::store::CountStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS features_x_category(feature, category, count);
    CREATE TABLE IF NOT EXISTS category_count(category, count);
    CREATE INDEX IF NOT EXISTS idx_features_x_category
        ON features_x_category(feature, category);
    CREATE INDEX IF NOT EXISTS idx_category_count ON category_count(category);
";

/// Configuration for the SQLite count store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqliteStoreConfig {
    /// Path to the database file.
    pub path: PathBuf,

    /// Whether to create the database file when it does not exist.
    #[serde(default)]
    pub create_if_missing: bool,

    /// How long to wait for another connection's write lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Whether to switch the database to write-ahead logging.
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_wal() -> bool {
    true
}

impl SqliteStoreConfig {
    /// Create a configuration for an existing database file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteStoreConfig {
            path: path.as_ref().to_path_buf(),
            create_if_missing: false,
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }

    /// Allow the store to create the database file.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

/// A count store persisted in SQLite.
///
/// The connection is opened by [`SqliteCountStore::open`] and held until
/// [`CountStore::close`] is called or the store is dropped.
#[derive(Debug)]
pub struct SqliteCountStore {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteCountStore {
    /// Open (and initialize the schema of) the database described by `config`.
    pub fn open(config: SqliteStoreConfig) -> Result<Self> {
        if !config.create_if_missing && !config.path.exists() {
            return Err(ClassyError::storage(format!(
                "database file not found: {}",
                config.path.display()
            )));
        }

        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.wal {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!("journal_mode set to {mode} for {}", config.path.display());
        }
        conn.execute_batch(SCHEMA)?;

        info!("opened sqlite count store at {}", config.path.display());
        Ok(SqliteCountStore {
            path: Some(config.path),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open a private in-memory SQLite database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteCountStore {
            path: None,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Path of the database file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_mut().ok_or_else(ClassyError::store_closed)?;
        f(conn)
    }

    /// Run `f` inside an immediate transaction and commit it.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.with_connection(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }
}

fn to_count(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| ClassyError::storage(format!("negative count: {value}")))
}

fn increment_pair(conn: &Connection, feature: &str, category: &str) -> Result<()> {
    let current: Option<i64> = conn
        .prepare_cached(
            "SELECT count FROM features_x_category WHERE feature = ?1 AND category = ?2",
        )?
        .query_row(params![feature, category], |row| row.get(0))
        .optional()?;

    match current {
        None => conn
            .prepare_cached(
                "INSERT INTO features_x_category (feature, category, count) VALUES (?1, ?2, 1)",
            )?
            .execute(params![feature, category])?,
        Some(count) => conn
            .prepare_cached(
                "UPDATE features_x_category SET count = ?3 WHERE feature = ?1 AND category = ?2",
            )?
            .execute(params![feature, category, count + 1])?,
    };
    Ok(())
}

fn increment_category(conn: &Connection, category: &str) -> Result<()> {
    let current: Option<i64> = conn
        .prepare_cached("SELECT count FROM category_count WHERE category = ?1")?
        .query_row(params![category], |row| row.get(0))
        .optional()?;

    match current {
        None => conn
            .prepare_cached("INSERT INTO category_count (category, count) VALUES (?1, 1)")?
            .execute(params![category])?,
        Some(count) => conn
            .prepare_cached("UPDATE category_count SET count = ?2 WHERE category = ?1")?
            .execute(params![category, count + 1])?,
    };
    Ok(())
}

impl CountStore for SqliteCountStore {
    fn increment_feature_category(&self, feature: &str, category: &str) -> Result<()> {
        self.write(|conn| increment_pair(conn, feature, category))
    }

    fn increment_category_count(&self, category: &str) -> Result<()> {
        self.write(|conn| increment_category(conn, category))
    }

    fn feature_category_count(&self, feature: &str, category: &str) -> Result<u64> {
        self.with_connection(|conn| {
            let count: Option<i64> = conn
                .prepare_cached(
                    "SELECT count FROM features_x_category WHERE feature = ?1 AND category = ?2",
                )?
                .query_row(params![feature, category], |row| row.get(0))
                .optional()?;
            to_count(count.unwrap_or(0))
        })
    }

    fn category_document_count(&self, category: &str) -> Result<u64> {
        self.with_connection(|conn| {
            let count: Option<i64> = conn
                .prepare_cached("SELECT count FROM category_count WHERE category = ?1")?
                .query_row(params![category], |row| row.get(0))
                .optional()?;
            to_count(count.unwrap_or(0))
        })
    }

    fn total_document_count(&self) -> Result<u64> {
        self.with_connection(|conn| {
            let total: i64 = conn
                .prepare_cached("SELECT COALESCE(SUM(count), 0) FROM category_count")?
                .query_row([], |row| row.get(0))?;
            to_count(total)
        })
    }

    fn categories(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare_cached("SELECT category FROM category_count ORDER BY rowid")?;
            let categories = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    fn record_document(&self, features: &[String], category: &str) -> Result<()> {
        self.write(|conn| {
            for feature in features {
                increment_pair(conn, feature, category)?;
            }
            increment_category(conn, category)
        })
    }

    fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| ClassyError::from(e))?;

        if let Some(path) = &self.path {
            info!("closed sqlite count store at {}", path.display());
        }
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "sqlite"
    }
}
