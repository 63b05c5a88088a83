/// Connection Management Module
///
/// This module owns the single native database handle, executes
/// parameterized statements against it, and provides transaction
/// primitives and the table-qualified CRUD helpers.
///
/// ## Concurrency
///
/// A `Connection` wraps exactly one `rusqlite::Connection`, opened on first
/// use and reused afterwards. It is `Send` but not `Sync`: share it by
/// reference within one thread, or wrap it in a `Mutex` to hand it between
/// threads. There is no pooling and no reconnect; a failed handle surfaces as
/// an error on the next statement.
use super::query::{QueryBuilder, QueryResult};
use super::statement::{compile_delete, compile_insert, compile_update};
use crate::config::{ConnectionConfig, Driver};
use crate::core::{Params, Result, Row, RowkeepError, Value};
use once_cell::unsync::OnceCell;
use rusqlite::Statement;
use std::cell::RefCell;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A statement recorded while the query log is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedQuery {
    pub sql: String,
    pub params: Params,
    pub elapsed: Duration,
}

/// Lazily opened database connection.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    handle: OnceCell<rusqlite::Connection>,
    query_log: RefCell<Option<Vec<LoggedQuery>>>,
}

impl Connection {
    /// Creates a connection for `config`. Nothing is opened until the first
    /// statement runs.
    pub fn new(config: ConnectionConfig) -> Self {
        Connection {
            config,
            handle: OnceCell::new(),
            query_log: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Checks if the native handle has been opened
    pub fn is_connected(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Returns the native handle, opening it on first call.
    ///
    /// # Errors
    ///
    /// Returns `RowkeepError::Connection` with the driver's error text if the
    /// database cannot be opened. A failed open is not memoized.
    pub fn handle(&self) -> Result<&rusqlite::Connection> {
        self.handle.get_or_try_init(|| self.open())
    }

    fn open(&self) -> Result<rusqlite::Connection> {
        let dsn = self.config.dsn();

        if self.config.driver != Driver::Sqlite {
            warn!(dsn = %dsn, "requested driver is not compiled in");
            return Err(RowkeepError::connection(format!(
                "driver `{}` is not available in this build (dsn: {})",
                self.config.driver, dsn
            )));
        }

        // Credentials are ignored by SQLite; the database path is the whole address.
        let conn = rusqlite::Connection::open(&self.config.database).map_err(|e| {
            error!(dsn = %dsn, error = %e, "failed to open database");
            RowkeepError::connection(format!("could not connect to {}: {}", dsn, e))
        })?;

        for (name, value) in &self.config.options {
            conn.pragma_update(None, name, value).map_err(|e| {
                RowkeepError::connection(format!(
                    "could not apply option {} = {} on {}: {}",
                    name, value, dsn, e
                ))
            })?;
        }

        info!(dsn = %dsn, "database connection established");
        Ok(conn)
    }

    // ------------------------------------------------------------------
    // Builder entry points
    // ------------------------------------------------------------------

    /// Starts a fresh builder selecting `*` with no table.
    pub fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    pub fn select<I, S>(&self, columns: I) -> QueryBuilder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder().select(columns)
    }

    pub fn select_all(&self) -> QueryBuilder<'_> {
        self.builder().select_all()
    }

    /// Shorthand for `select_all().from(table)`.
    pub fn table(&self, table: impl Into<String>) -> QueryBuilder<'_> {
        self.select_all().from(table)
    }

    // ------------------------------------------------------------------
    // Raw execution primitives
    // ------------------------------------------------------------------

    /// Prepares `sql`, binds `params` and executes it.
    ///
    /// Named parameters bind to `:name` placeholders; positional parameters
    /// bind to `?` / `?N` in order. Values are never interpolated into the SQL.
    ///
    /// # Errors
    ///
    /// Returns `RowkeepError::Query` (with the SQL attached) if preparation,
    /// binding or execution fails.
    pub fn query(&self, sql: &str, params: impl Into<Params>) -> Result<QueryResult> {
        let params = params.into();
        let conn = self.handle()?;

        let started = Instant::now();
        let result = run_statement(conn, sql, &params);
        let elapsed = started.elapsed();

        match &result {
            Ok(outcome) => debug!(
                sql,
                elapsed_ms = elapsed.as_millis() as u64,
                rows = outcome.rows.len(),
                affected = outcome.affected_rows,
                "statement executed"
            ),
            Err(e) => error!(sql, error = %e, "statement failed"),
        }

        if let Some(log) = self.query_log.borrow_mut().as_mut() {
            log.push(LoggedQuery {
                sql: sql.to_string(),
                params,
                elapsed,
            });
        }

        result
    }

    pub fn fetch_all(&self, sql: &str, params: impl Into<Params>) -> Result<Vec<Row>> {
        Ok(self.query(sql, params)?.rows)
    }

    pub fn fetch(&self, sql: &str, params: impl Into<Params>) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.rows.into_iter().next())
    }

    /// Executes a statement and returns the number of affected rows.
    pub fn execute(&self, sql: &str, params: impl Into<Params>) -> Result<usize> {
        Ok(self.query(sql, params)?.affected_rows)
    }

    /// Runs several `;`-separated statements without parameters (schema setup).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.handle()?;
        debug!(sql, "executing batch");
        conn.execute_batch(sql).map_err(|e| RowkeepError::query(e, sql))
    }

    /// Identifier generated by the most recent successful INSERT.
    pub fn last_insert_id(&self) -> Result<String> {
        Ok(self.handle()?.last_insert_rowid().to_string())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Starts a transaction.
    ///
    /// Transactions do not nest. Calling this while one is already open is
    /// the caller's responsibility; SQLite reports it as a `Query` error.
    pub fn begin_transaction(&self) -> Result<()> {
        self.execute("BEGIN", Params::None).map(|_| ())
    }

    pub fn commit(&self) -> Result<()> {
        self.execute("COMMIT", Params::None).map(|_| ())
    }

    pub fn rollback(&self) -> Result<()> {
        self.execute("ROLLBACK", Params::None).map(|_| ())
    }

    /// Runs `f` inside a transaction: commits on `Ok`, rolls back on `Err`.
    ///
    /// A failed COMMIT (e.g. a deferred constraint) is rolled back too, so the
    /// connection never stays inside an open transaction.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.begin_transaction()?;
        let outcome = f(self).and_then(|value| self.commit().map(|_| value));
        let still_open = self.handle().map_or(false, |conn| !conn.is_autocommit());
        if outcome.is_err() && still_open {
            if let Err(rollback_err) = self.rollback() {
                warn!(error = %rollback_err, "rollback failed after transaction error");
            }
        }
        outcome
    }

    // ------------------------------------------------------------------
    // CRUD helpers
    // ------------------------------------------------------------------

    /// Inserts `data` into `table` and returns the generated row id.
    pub fn insert(&self, table: &str, data: &Row) -> Result<i64> {
        let (sql, params) = compile_insert(table, data);
        self.execute(&sql, params)?;
        Ok(self.handle()?.last_insert_rowid())
    }

    /// Updates rows of `table` matching every `conditions` pair.
    pub fn update(&self, table: &str, data: &Row, conditions: &Row) -> Result<usize> {
        let (sql, params) = compile_update(table, data, conditions)?;
        self.execute(&sql, params)
    }

    /// Deletes rows of `table` matching every `conditions` pair.
    pub fn delete(&self, table: &str, conditions: &Row) -> Result<usize> {
        let (sql, params) = compile_delete(table, conditions)?;
        self.execute(&sql, params)
    }

    // ------------------------------------------------------------------
    // Query log
    // ------------------------------------------------------------------

    /// Starts recording executed statements.
    pub fn enable_query_log(&self) {
        let mut log = self.query_log.borrow_mut();
        if log.is_none() {
            *log = Some(Vec::new());
        }
    }

    /// Stops recording and drops anything recorded.
    pub fn disable_query_log(&self) {
        *self.query_log.borrow_mut() = None;
    }

    pub fn query_log(&self) -> Vec<LoggedQuery> {
        self.query_log.borrow().clone().unwrap_or_default()
    }

    /// Returns the recorded statements and clears the log, keeping it enabled.
    pub fn flush_query_log(&self) -> Vec<LoggedQuery> {
        self.query_log
            .borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

fn run_statement(conn: &rusqlite::Connection, sql: &str, params: &Params) -> Result<QueryResult> {
    let mut stmt = conn.prepare(sql).map_err(|e| RowkeepError::query(e, sql))?;
    bind_params(&mut stmt, params, sql)?;

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    if columns.is_empty() {
        let affected = stmt.raw_execute().map_err(|e| RowkeepError::query(e, sql))?;
        return Ok(QueryResult {
            columns,
            rows: Vec::new(),
            affected_rows: affected,
        });
    }

    let mut rows = Vec::new();
    let mut cursor = stmt.raw_query();
    while let Some(raw) = cursor.next().map_err(|e| RowkeepError::query(e, sql))? {
        let mut row = Row::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            let value = raw.get_ref(index).map_err(|e| RowkeepError::query(e, sql))?;
            row.insert(name.clone(), Value::from(value));
        }
        rows.push(row);
    }

    Ok(QueryResult {
        columns,
        rows,
        affected_rows: 0,
    })
}

fn bind_params(stmt: &mut Statement<'_>, params: &Params, sql: &str) -> Result<()> {
    let expected = stmt.parameter_count();
    let supplied = match params {
        Params::None => 0,
        Params::Named(row) => row.len(),
        Params::Positional(values) => values.len(),
    };
    if supplied != expected {
        return Err(RowkeepError::query(
            format!(
                "statement expects {} parameter(s) but {} were supplied",
                expected, supplied
            ),
            sql,
        ));
    }

    match params {
        Params::None => {}
        Params::Named(row) => {
            for (name, value) in row {
                let placeholder = format!(":{}", name);
                let index = stmt
                    .parameter_index(&placeholder)
                    .map_err(|e| RowkeepError::query(e, sql))?
                    .ok_or_else(|| {
                        RowkeepError::query(format!("unknown parameter {}", placeholder), sql)
                    })?;
                stmt.raw_bind_parameter(index, value)
                    .map_err(|e| RowkeepError::query(e, sql))?;
            }
        }
        Params::Positional(values) => {
            for (offset, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(offset + 1, value)
                    .map_err(|e| RowkeepError::query(e, sql))?;
            }
        }
    }

    Ok(())
}
