//! Sync-column propagation.
//!
//! Columns marked `sync` hold one value per logical entity. After a write to
//! one locale row, the written values are copied to every sibling row with a
//! single UPDATE keyed on the entity's own key and `language_code <> ?`.
//! The caller runs this inside the same savepoint as the primary write.

use crate::rows::key_conditions;
use crate::L10nResult;
use polyglot_db::{Condition, Connection, Update, col, execute};
use polyglot_model::{LANGUAGE_CODE_COLUMN, ModelMeta};
use polyglot_types::LanguageCode;
use serde_json::{Map, Value};
use tracing::debug;

/// Sync columns present in `values`, in declaration order.
pub fn sync_assignments(meta: &ModelMeta, values: &Map<String, Value>) -> Vec<(String, Value)> {
    meta.sync_columns()
        .iter()
        .filter_map(|column| values.get(column).map(|v| (column.clone(), v.clone())))
        .collect()
}

/// The propagation UPDATE, or `None` when there is nothing to copy.
pub fn propagation_statement(
    meta: &ModelMeta,
    key: &[Value],
    written: &LanguageCode,
    values: &Map<String, Value>,
) -> L10nResult<Option<Update>> {
    let assignments = sync_assignments(meta, values);
    if assignments.is_empty() {
        return Ok(None);
    }
    let mut update = Update::new(meta.table());
    for (column, value) in assignments {
        update = update.set(&column, value);
    }
    for condition in key_conditions(meta, key, None)? {
        update = update.filter(condition);
    }
    Ok(Some(
        update.filter(Condition::ne(col(LANGUAGE_CODE_COLUMN), written.as_str())),
    ))
}

/// Copies the sync values just written under `written` to every other
/// locale row of the entity. Returns the number of sibling rows updated.
pub fn propagate(
    conn: &Connection,
    meta: &ModelMeta,
    key: &[Value],
    written: &LanguageCode,
    values: &Map<String, Value>,
) -> L10nResult<usize> {
    let Some(update) = propagation_statement(meta, key, written, values)? else {
        return Ok(0);
    };
    let synced = execute(conn, &update.to_sql()?)?;
    debug!(
        entity = meta.entity_type(),
        locale = %written,
        columns = update.assignments.len(),
        siblings = synced,
        "propagated sync columns"
    );
    Ok(synced)
}
