/// Query Building Module
///
/// This module holds the mutable query state behind the fluent builder and
/// renders it to parameterized SQL. Values never reach the SQL text: each
/// predicate value is bound to its own `:param_<index>` placeholder.
/// Table and column names are interpolated as-is and must be trusted input.
use super::connection::Connection;
use crate::core::{Params, Result, Row, RowkeepError, Value};
use std::fmt;
use std::str::FromStr;

/// Result of executing a statement through [`Connection::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column names in result order (empty for statements that return no rows)
    pub columns: Vec<String>,
    /// Returned rows
    pub rows: Vec<Row>,
    /// Rows changed by an INSERT/UPDATE/DELETE (zero for queries)
    pub affected_rows: usize,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Comparison operator of a WHERE predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    LtGt,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    Is,
    IsNot,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::LtGt => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = RowkeepError;

    /// Parses the SQL spelling of an operator, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        let op = match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<>" => Operator::LtGt,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "IS" => Operator::Is,
            "IS NOT" => Operator::IsNot,
            _ => {
                return Err(RowkeepError::Query {
                    message: format!("unsupported operator `{}`", s),
                    sql: String::new(),
                })
            }
        };
        Ok(op)
    }
}

/// Boolean combinator joining a predicate to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// Sort direction of an ORDER BY expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A single WHERE predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub boolean: Boolean,
}

/// The clauses accumulated by a builder between `select()` and execution.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub columns: Vec<String>,
    pub table: Option<String>,
    pub wheres: Vec<Predicate>,
    pub orders: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for QueryState {
    fn default() -> Self {
        QueryState {
            columns: vec!["*".to_string()],
            table: None,
            wheres: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl QueryState {
    /// Discards every clause, returning to `SELECT *` with no table.
    pub fn reset(&mut self) {
        *self = QueryState::default();
    }

    /// Renders the state to a SELECT statement and its named parameters.
    ///
    /// # Errors
    ///
    /// Returns `RowkeepError::Query` if no table has been set.
    pub fn render(&self) -> Result<(String, Params)> {
        let table = self.table.as_deref().ok_or_else(|| RowkeepError::Query {
            message: "no table selected; call from() before executing".to_string(),
            sql: String::new(),
        })?;

        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), table);

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            for (index, predicate) in self.wheres.iter().enumerate() {
                if index > 0 {
                    sql.push(' ');
                    sql.push_str(predicate.boolean.as_sql());
                    sql.push(' ');
                }
                sql.push_str(&format!(
                    "{} {} :param_{}",
                    predicate.column, predicate.operator, index
                ));
            }
        }

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.orders.join(", "));
        }

        if let Some(limit) = self.limit.filter(|n| *n > 0) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset.filter(|n| *n > 0) {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok((sql, self.params()))
    }

    /// Named parameters in predicate order, independent of rendering.
    pub fn params(&self) -> Params {
        let row: Row = self
            .wheres
            .iter()
            .enumerate()
            .map(|(index, predicate)| (format!("param_{}", index), predicate.value.clone()))
            .collect();
        Params::Named(row)
    }
}

/// Fluent SELECT builder over a borrowed [`Connection`].
///
/// The builder is stateful: each method mutates the accumulated
/// [`QueryState`] and hands the builder back. Start a fresh builder per
/// logical query rather than reusing one.
///
/// `select()` is a reset point. Calling it after `and_where`, `order_by` or
/// `limit` throws those clauses away:
///
/// ```
/// use rowkeep::{Connection, ConnectionConfig, Operator};
///
/// let db = Connection::new(ConnectionConfig::in_memory());
/// let (sql, _) = db
///     .table("articles")
///     .and_where("status", Operator::Eq, "draft")
///     .select(["id"])
///     .from("articles")
///     .to_sql()
///     .unwrap();
/// assert_eq!(sql, "SELECT id FROM articles");
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'c> {
    connection: &'c Connection,
    state: QueryState,
}

impl<'c> QueryBuilder<'c> {
    pub(crate) fn new(connection: &'c Connection) -> Self {
        QueryBuilder {
            connection,
            state: QueryState::default(),
        }
    }

    /// Resets the whole query state, then selects `columns`.
    /// An empty column list selects `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.reset();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.state.columns = columns;
        }
        self
    }

    /// Resets the whole query state and selects `*`.
    pub fn select_all(self) -> Self {
        self.select(Vec::<String>::new())
    }

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.state.table = Some(table.into());
        self
    }

    /// Appends a predicate joined to the previous ones by `boolean`.
    pub fn where_clause(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
        boolean: Boolean,
    ) -> Self {
        self.state.wheres.push(Predicate {
            column: column.into(),
            operator,
            value: value.into(),
            boolean,
        });
        self
    }

    pub fn and_where(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.where_clause(column, operator, value, Boolean::And)
    }

    pub fn or_where(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.where_clause(column, operator, value, Boolean::Or)
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.state
            .orders
            .push(format!("{} {}", column.into(), direction.as_sql()));
        self
    }

    pub fn order_by_asc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.state.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.state.offset = Some(n);
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Renders the current state without executing it.
    pub fn to_sql(&self) -> Result<(String, Params)> {
        self.state.render()
    }

    /// Executes the query and returns every row.
    pub fn get(&self) -> Result<Vec<Row>> {
        let (sql, params) = self.state.render()?;
        self.connection.fetch_all(&sql, params)
    }

    /// Forces `LIMIT 1`, executes, and returns the first row if any.
    pub fn first(mut self) -> Result<Option<Row>> {
        self.state.limit = Some(1);
        Ok(self.get()?.into_iter().next())
    }
}
