//! Error types for the classy library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`ClassyError`] enum.
//!
//! # Examples
//!
//! ```
//! use classy::error::{ClassyError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ClassyError::config("missing dbPath"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for classy operations.
///
/// Missing counts and zero denominators are never reported through this type:
/// they resolve to `0` in the probability engine.
#[derive(Error, Debug)]
pub enum ClassyError {
    /// I/O errors (reading option files, checking database paths)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Count store errors (closed store, missing database file, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite errors raised by the persisted count store
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Feature extraction errors
    #[error("Feature extraction error: {0}")]
    Features(String),

    /// Invalid construction options
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Batch worker failures
    #[error("Worker error: {0}")]
    Worker(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with ClassyError.
pub type Result<T> = std::result::Result<T, ClassyError>;

impl ClassyError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ClassyError::Storage(msg.into())
    }

    /// Create a new feature extraction error.
    pub fn features<S: Into<String>>(msg: S) -> Self {
        ClassyError::Features(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ClassyError::Config(msg.into())
    }

    /// Create a new worker error.
    pub fn worker<S: Into<String>>(msg: S) -> Self {
        ClassyError::Worker(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ClassyError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Error returned by every operation on a store after `close()`.
    pub fn store_closed() -> Self {
        ClassyError::Storage("store is closed".to_string())
    }
}
