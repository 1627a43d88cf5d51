//! Conversion between JSON column values and SQLite values.
//!
//! Records carry `serde_json::Value`s; SQLite stores integers, reals, text,
//! blobs and NULL. Booleans are stored as 0/1 and JSON columns as text, so
//! decoding needs the declared [`FieldType`] to restore the original shape.

use crate::DbResult;
use polyglot_model::FieldType;
use rusqlite::types::ValueRef;
use serde_json::{Number, Value};

pub use rusqlite::types::Value as SqlValue;

/// Encodes a JSON value for binding.
///
/// Arrays and objects are bound as their JSON text. Integers outside the
/// `i64` range fall back to `REAL`.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Decodes a column according to its declared type.
pub fn from_sql_value(raw: ValueRef<'_>, field_type: FieldType) -> DbResult<Value> {
    if let ValueRef::Null = raw {
        return Ok(Value::Null);
    }
    let value = match (field_type, raw) {
        (FieldType::Bool, ValueRef::Integer(i)) => Value::Bool(i != 0),
        (FieldType::Json, ValueRef::Text(bytes)) => serde_json::from_slice(bytes)?,
        (FieldType::Real, ValueRef::Integer(i)) => real(i as f64),
        _ => dynamic_value(raw),
    };
    Ok(value)
}

/// Decodes a column using only SQLite's storage class.
pub fn dynamic_value(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => real(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

fn real(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}
