/// Rowkeep Error Module
///
/// This module defines the error types for the data-access layer.
/// Every failure propagates to the caller immediately; nothing in this
/// crate retries.
use thiserror::Error;

/// Error type for connection, query and record operations.
///
/// The variants map onto the three failure classes of the data layer:
/// - Opening the connection (fatal until a new `Connection` is built)
/// - Preparing, binding or executing a statement
/// - Fail-fast lookups that found no row
///
/// plus the ambient configuration, I/O and JSON failures.
#[derive(Error, Debug)]
pub enum RowkeepError {
    /// The database connection could not be opened.
    /// The message always carries the driver's own error text.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A statement failed to prepare, bind or execute.
    #[error("Query error: {message} [SQL: {sql}]")]
    Query { message: String, sql: String },

    /// Raised only by `find_or_fail`; every other finder returns `None`.
    #[error("Model not found with ID: {id}")]
    NotFound { id: String },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RowkeepError {
    /// Builds a `Query` error from a driver error and the statement that caused it.
    pub fn query(err: impl std::fmt::Display, sql: &str) -> Self {
        RowkeepError::Query {
            message: err.to_string(),
            sql: sql.to_string(),
        }
    }

    /// Builds a `Connection` error from any displayable cause.
    pub fn connection(err: impl std::fmt::Display) -> Self {
        RowkeepError::Connection {
            message: err.to_string(),
        }
    }
}

/// Type alias for Result to use RowkeepError as the error type.
pub type Result<T> = std::result::Result<T, RowkeepError>;
