/// Database Module
///
/// The data-access core, organized into focused submodules:
/// - **Connection Management** (`connection.rs`): the lazily opened handle,
///   raw statement execution, transactions and CRUD helpers
/// - **Query Building** (`query.rs`): query state, the fluent SELECT builder
///   and its SQL rendering
/// - **Statement Compilation** (`statement.rs`): INSERT/UPDATE/DELETE text for
///   the CRUD helpers
///
/// All operations use the standardized `RowkeepError` type.
pub mod connection;
pub mod query;
pub mod statement;

pub use connection::*;
pub use query::*;
