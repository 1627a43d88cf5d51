//! Statement execution against a borrowed connection.
//!
//! Every function takes `&Connection` so it runs inside whatever transaction
//! the caller holds; a `rusqlite::Transaction` derefs to a `Connection`.

use crate::query::{Projection, Select, Sql, quote_ident};
use crate::value::{dynamic_value, from_sql_value};
use crate::{DbError, DbResult};
use polyglot_model::ColumnSpec;
use rusqlite::{Connection, params_from_iter};
use serde_json::{Map, Value};
use tracing::debug;

/// Executes a non-query statement and returns the affected row count.
pub fn execute(conn: &Connection, sql: &Sql) -> DbResult<usize> {
    debug!(sql = %sql.text, params = sql.params.len(), "execute");
    let affected = conn.execute(&sql.text, params_from_iter(sql.params.iter()))?;
    Ok(affected)
}

/// Runs a SELECT and decodes each row using the given column types.
///
/// The statement's projection is replaced with exactly `columns`, so decoding
/// is positional and cannot drift from the select list.
pub fn fetch(conn: &Connection, select: &Select, columns: &[ColumnSpec]) -> DbResult<Vec<Map<String, Value>>> {
    let mut select = select.clone();
    select.projection = Projection::Columns(columns.iter().map(|c| c.name.clone()).collect());
    let sql = select.to_sql();
    debug!(sql = %sql.text, params = sql.params.len(), "fetch");

    let mut stmt = conn.prepare(&sql.text)?;
    let mut rows = stmt.query(params_from_iter(sql.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Map::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let value = from_sql_value(row.get_ref(i)?, column.field_type)?;
            values.insert(column.name.clone(), value);
        }
        out.push(values);
    }
    Ok(out)
}

/// Runs a SELECT with its own projection and decodes by storage class.
pub fn fetch_dynamic(conn: &Connection, select: &Select) -> DbResult<Vec<Map<String, Value>>> {
    let sql = select.to_sql();
    debug!(sql = %sql.text, params = sql.params.len(), "fetch_dynamic");

    let mut stmt = conn.prepare(&sql.text)?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| (*n).to_string()).collect();
    let mut rows = stmt.query(params_from_iter(sql.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Map::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            values.insert(name.clone(), dynamic_value(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(out)
}

/// Runs a single-column SELECT and returns the column's values.
pub fn fetch_column(conn: &Connection, select: &Select) -> DbResult<Vec<Value>> {
    let sql = select.to_sql();
    debug!(sql = %sql.text, params = sql.params.len(), "fetch_column");

    let mut stmt = conn.prepare(&sql.text)?;
    if stmt.column_count() != 1 {
        return Err(DbError::InvalidStatement(format!(
            "expected one column, statement selects {}",
            stmt.column_count()
        )));
    }
    let mut rows = stmt.query(params_from_iter(sql.params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(dynamic_value(row.get_ref(0)?));
    }
    Ok(out)
}

/// Returns whether the SELECT matches at least one row.
pub fn exists(conn: &Connection, select: &Select) -> DbResult<bool> {
    let mut select = select.clone();
    select.projection = Projection::One;
    select.order.clear();
    select.limit = Some(1);
    select.offset = None;
    let sql = select.to_sql();
    debug!(sql = %sql.text, "exists");

    let mut stmt = conn.prepare(&sql.text)?;
    let mut rows = stmt.query(params_from_iter(sql.params.iter()))?;
    Ok(rows.next()?.is_some())
}

/// Runs `f` inside a named savepoint.
///
/// A savepoint nests inside the caller's open transaction; with no
/// transaction open it behaves as one. On error everything done since the
/// savepoint is rolled back and the error is returned unchanged.
pub fn with_savepoint<T, E, F>(conn: &Connection, name: &str, f: F) -> Result<T, E>
where
    E: From<DbError>,
    F: FnOnce(&Connection) -> Result<T, E>,
{
    let name = quote_ident(name);
    conn.execute_batch(&format!("SAVEPOINT {name}"))
        .map_err(|e| E::from(DbError::from(e)))?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))
                .map_err(|e| E::from(DbError::from(e)))?;
            Ok(value)
        }
        Err(err) => {
            debug!(savepoint = %name, "rolling back savepoint");
            if let Err(rollback) = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}")) {
                tracing::warn!(savepoint = %name, error = %rollback, "savepoint rollback failed");
            }
            Err(err)
        }
    }
}
