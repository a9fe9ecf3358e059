//! Error types for filenest.

use thiserror::Error;

/// Common error type for filenest.
#[derive(Error, Debug)]
pub enum FilenestError {
    /// File or user not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Rename target already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// No snapshot exists for the requested date.
    #[error("snapshot {0} not found")]
    SnapshotNotFound(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Username already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected filesystem failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FilenestError {
    fn from(e: sqlx::Error) -> Self {
        FilenestError::Database(e.to_string())
    }
}

/// Result type alias for filenest operations.
pub type Result<T> = std::result::Result<T, FilenestError>;
