/// Statement Compilation Module
///
/// Renders the table-qualified INSERT, UPDATE and DELETE statements used by
/// the CRUD helpers on [`Connection`](super::Connection). These bypass the
/// builder state entirely. Every value goes through a named placeholder;
/// WHERE maps are equality tests joined with AND.
use crate::core::{Params, Result, Row, RowkeepError};

/// Prefix for WHERE parameters in UPDATE, so `SET id = :id` and
/// `WHERE id = :where_id` never share a name.
pub const WHERE_PARAM_PREFIX: &str = "where_";

/// `INSERT INTO t (a, b) VALUES (:a, :b)` with `data` as the parameter set.
///
/// An empty `data` map renders `INSERT INTO t DEFAULT VALUES`.
pub fn compile_insert(table: &str, data: &Row) -> (String, Params) {
    if data.is_empty() {
        return (format!("INSERT INTO {} DEFAULT VALUES", table), Params::None);
    }

    let columns: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{}", c)).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    (sql, Params::Named(data.clone()))
}

/// `UPDATE t SET a = :a WHERE k = :where_k AND ..`.
///
/// # Errors
///
/// Returns `RowkeepError::Query` if `data` or `conditions` is empty, or if a
/// `data` column is itself named `where_<condition column>`.
pub fn compile_update(table: &str, data: &Row, conditions: &Row) -> Result<(String, Params)> {
    if data.is_empty() {
        return Err(RowkeepError::Query {
            message: format!("refusing to update `{}` with no columns", table),
            sql: String::new(),
        });
    }
    if conditions.is_empty() {
        return Err(RowkeepError::Query {
            message: format!("refusing to update `{}` without conditions", table),
            sql: String::new(),
        });
    }

    let assignments: Vec<String> = data.keys().map(|c| format!("{} = :{}", c, c)).collect();
    let predicates: Vec<String> = conditions
        .keys()
        .map(|c| format!("{} = :{}{}", c, WHERE_PARAM_PREFIX, c))
        .collect();

    let mut params = data.clone();
    for (column, value) in conditions {
        let name = format!("{}{}", WHERE_PARAM_PREFIX, column);
        if params.contains_key(&name) {
            return Err(RowkeepError::Query {
                message: format!(
                    "column `{}` of `{}` clashes with the parameter for condition `{}`",
                    name, table, column
                ),
                sql: String::new(),
            });
        }
        params.insert(name, value.clone());
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        assignments.join(", "),
        predicates.join(" AND ")
    );
    Ok((sql, Params::Named(params)))
}

/// `DELETE FROM t WHERE k = :k AND ..`.
///
/// # Errors
///
/// Returns `RowkeepError::Query` if `conditions` is empty; this helper never
/// issues an unconditional delete.
pub fn compile_delete(table: &str, conditions: &Row) -> Result<(String, Params)> {
    if conditions.is_empty() {
        return Err(RowkeepError::Query {
            message: format!("refusing to delete from `{}` without conditions", table),
            sql: String::new(),
        });
    }

    let predicates: Vec<String> = conditions.keys().map(|c| format!("{} = :{}", c, c)).collect();
    let sql = format!("DELETE FROM {} WHERE {}", table, predicates.join(" AND "));
    Ok((sql, Params::Named(conditions.clone())))
}
