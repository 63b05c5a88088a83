//! Fluent SQL query building and active-record persistence over SQLite.
//!
//! ```
//! use rowkeep::{row, Connection, ConnectionConfig, Direction, Operator};
//!
//! let db = Connection::new(ConnectionConfig::in_memory());
//! db.execute_batch("CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT, status TEXT)")?;
//! db.insert("articles", &row! { "title" => "Hello", "status" => "draft" })?;
//!
//! let drafts = db
//!     .table("articles")
//!     .and_where("status", Operator::Eq, "draft")
//!     .order_by("id", Direction::Desc)
//!     .limit(10)
//!     .get()?;
//! assert_eq!(drafts.len(), 1);
//! # Ok::<(), rowkeep::RowkeepError>(())
//! ```

// Core infrastructure modules
pub mod config;
pub mod core;

// Persistence layer
pub mod model;

#[cfg(test)]
mod test_utils;

pub use crate::config::{ConnectionConfig, Driver};
pub use crate::core::db::{
    Boolean, Connection, Direction, LoggedQuery, Operator, QueryBuilder, QueryResult, QueryState,
};
pub use crate::core::{Params, Result, Row, RowkeepError, Value};
pub use crate::model::{Entity, Model};
