//! Row-level statement helpers shared by the write paths.

use crate::{L10nError, L10nResult};
use chrono::{SecondsFormat, Utc};
use polyglot_db::{
    ColumnRef, Condition, Connection, Delete, Direction, Insert, OrderTerm, Projection, Select,
    Update, execute, fetch,
};
use polyglot_model::{LANGUAGE_CODE_COLUMN, ModelError, ModelMeta};
use polyglot_types::LanguageCode;
use serde_json::{Map, Value};

pub(crate) type Row = Map<String, Value>;

/// Equality conditions on the entity's own key columns.
pub(crate) fn key_conditions(
    meta: &ModelMeta,
    key: &[Value],
    qualifier: Option<&str>,
) -> L10nResult<Vec<Condition>> {
    let columns = meta.identity_columns();
    if key.len() != columns.len() {
        return Err(L10nError::KeyArity {
            entity_type: meta.entity_type().to_string(),
            expected: columns.len(),
            got: key.len(),
        });
    }
    columns
        .iter()
        .zip(key)
        .map(|(column, value)| {
            if value.is_null() {
                return Err(ModelError::MissingKey {
                    entity_type: meta.entity_type().to_string(),
                    column: column.clone(),
                }
                .into());
            }
            let column = match qualifier {
                Some(q) => ColumnRef::qualified(q, column),
                None => ColumnRef::new(column),
            };
            Ok(Condition::eq(column, value.clone()))
        })
        .collect()
}

pub(crate) fn locale_condition(locale: &LanguageCode, qualifier: Option<&str>) -> Condition {
    let column = match qualifier {
        Some(q) => ColumnRef::qualified(q, LANGUAGE_CODE_COLUMN),
        None => ColumnRef::new(LANGUAGE_CODE_COLUMN),
    };
    Condition::eq(column, locale.as_str())
}

/// `deleted_at IS NULL` for soft-delete entities.
pub(crate) fn live_condition(meta: &ModelMeta, qualifier: Option<&str>) -> Option<Condition> {
    meta.soft_delete_column().map(|column| {
        Condition::IsNull(match qualifier {
            Some(q) => ColumnRef::qualified(q, column),
            None => ColumnRef::new(column),
        })
    })
}

pub(crate) fn format_key(key: &[Value]) -> String {
    let parts: Vec<String> = key.iter().map(Value::to_string).collect();
    parts.join(",")
}

/// Keeps only physical columns of the entity.
pub(crate) fn declared_values(meta: &ModelMeta, values: &Row) -> Row {
    values
        .iter()
        .filter(|(name, _)| meta.columns().iter().any(|c| c.name == **name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// The live row for `key` in exactly `locale`.
pub(crate) fn exact_row(
    conn: &Connection,
    meta: &ModelMeta,
    key: &[Value],
    locale: &LanguageCode,
) -> L10nResult<Option<Row>> {
    let table = meta.table();
    let mut select = Select::from_table(table, Projection::Columns(Vec::new()))
        .filter(locale_condition(locale, Some(table)))
        .limit(1);
    for condition in key_conditions(meta, key, Some(table))? {
        select = select.filter(condition);
    }
    if let Some(live) = live_condition(meta, Some(table)) {
        select = select.filter(live);
    }
    Ok(fetch(conn, &select, meta.columns())?.into_iter().next())
}

/// Any live row of the entity, preferring the given locales in order.
pub(crate) fn seed_row(
    conn: &Connection,
    meta: &ModelMeta,
    key: &[Value],
    preferred: &[&LanguageCode],
) -> L10nResult<Option<Row>> {
    let table = meta.table();
    let mut select = Select::from_table(table, Projection::Columns(Vec::new())).limit(1);
    for condition in key_conditions(meta, key, Some(table))? {
        select = select.filter(condition);
    }
    if let Some(live) = live_condition(meta, Some(table)) {
        select = select.filter(live);
    }
    for locale in preferred {
        select = select.order_by(OrderTerm::Matches(
            ColumnRef::qualified(table, LANGUAGE_CODE_COLUMN),
            Value::from(locale.as_str()),
            Direction::Desc,
        ));
    }
    Ok(fetch(conn, &select, meta.columns())?.into_iter().next())
}

pub(crate) fn insert_row(conn: &Connection, meta: &ModelMeta, row: &Row) -> L10nResult<usize> {
    let insert = row
        .iter()
        .fold(Insert::new(meta.table()), |insert, (column, value)| {
            insert.value(column, value.clone())
        });
    Ok(execute(conn, &insert.to_sql()?)?)
}

/// Inserts the row or overwrites the existing row with the same full key.
pub(crate) fn upsert_row(conn: &Connection, meta: &ModelMeta, row: &Row) -> L10nResult<usize> {
    let insert = row
        .iter()
        .fold(Insert::new(meta.table()), |insert, (column, value)| {
            insert.value(column, value.clone())
        })
        .upsert_on(&meta.schema().key_columns());
    Ok(execute(conn, &insert.to_sql()?)?)
}

/// Hard-deletes soft-deleted leftovers of `key` in `locale`, so a fresh row
/// can take their primary key.
pub(crate) fn purge_deleted(
    conn: &Connection,
    meta: &ModelMeta,
    key: &[Value],
    locale: &LanguageCode,
) -> L10nResult<usize> {
    let Some(column) = meta.soft_delete_column() else {
        return Ok(0);
    };
    let mut delete = Delete::new(meta.table())
        .filter(locale_condition(locale, None))
        .filter(Condition::IsNotNull(ColumnRef::new(column)));
    for condition in key_conditions(meta, key, None)? {
        delete = delete.filter(condition);
    }
    Ok(execute(conn, &delete.to_sql())?)
}

/// Deletes (or soft-deletes) the rows matching `conditions`.
pub(crate) fn delete_rows(
    conn: &Connection,
    meta: &ModelMeta,
    conditions: Vec<Condition>,
) -> L10nResult<usize> {
    let sql = match meta.soft_delete_column() {
        Some(column) => {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
            let mut update = Update::new(meta.table())
                .set(column, now)
                .filter(Condition::IsNull(ColumnRef::new(column)));
            for condition in conditions {
                update = update.filter(condition);
            }
            update.to_sql()?
        }
        None => {
            let mut delete = Delete::new(meta.table());
            for condition in conditions {
                delete = delete.filter(condition);
            }
            delete.to_sql()
        }
    };
    Ok(execute(conn, &sql)?)
}
