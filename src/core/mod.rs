/// Core Module
///
/// Shared infrastructure for the data-access layer: values and rows, error
/// handling, and the database connection with its query builder.
pub mod db;
pub mod error;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{Result, RowkeepError};
pub use value::{Params, Row, Value};
