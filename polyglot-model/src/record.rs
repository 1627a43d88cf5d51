use crate::{EntitySchema, LANGUAGE_CODE_COLUMN, ModelError, ModelResult};
use polyglot_types::LanguageCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed struct that maps onto an entity schema.
///
/// Records are produced from models through serde, so field names must match
/// column names. A localizable model usually carries a `language_code: String`
/// field; when it does not, the column is simply dropped on conversion.
pub trait Model: Serialize + DeserializeOwned {
    /// Entity type name, matching `EntitySchema::entity_type`.
    const ENTITY_TYPE: &'static str;

    /// The schema registered for this model.
    fn schema() -> EntitySchema;
}

/// A generic row of an entity.
///
/// All reads and writes flow through this type. `values` holds one JSON value
/// per column, including `language_code` for localizable entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity_type: String,
    pub values: Map<String, Value>,
}

impl Record {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            values: Map::new(),
        }
    }

    /// Builds a record from a JSON object.
    pub fn from_values(entity_type: &str, values: Value) -> ModelResult<Self> {
        match values {
            Value::Object(values) => Ok(Self {
                entity_type: entity_type.into(),
                values,
            }),
            other => Err(ModelError::NotAnObject(json_kind(&other).into())),
        }
    }

    /// Converts a typed model into a record.
    pub fn from_model<T: Model>(model: &T) -> ModelResult<Self> {
        Self::from_values(T::ENTITY_TYPE, serde_json::to_value(model)?)
    }

    /// Converts the record back into a typed model.
    pub fn into_model<T: Model>(self) -> ModelResult<T> {
        Ok(serde_json::from_value(Value::Object(self.values))?)
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    /// Extract a string value.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Extract an integer value.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Extract a numeric value.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    /// Extract a boolean value.
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(Value::as_bool)
    }

    /// The row's locale, if set.
    pub fn language_code(&self) -> Option<&str> {
        self.get_str(LANGUAGE_CODE_COLUMN)
    }

    pub fn set_locale(&mut self, locale: &LanguageCode) {
        self.set(LANGUAGE_CODE_COLUMN, locale.as_str());
    }

    /// Whether the row belongs to the given global locale.
    pub fn is_global(&self, global: &LanguageCode) -> bool {
        self.language_code() == Some(global.as_str())
    }

    /// Values of the entity's own key columns (without `language_code`), in
    /// key order.
    pub fn key_values(&self, schema: &EntitySchema) -> ModelResult<Vec<Value>> {
        schema
            .primary_key
            .iter()
            .map(|column| match self.get(column) {
                Some(value) if !value.is_null() => Ok(value.clone()),
                _ => Err(ModelError::MissingKey {
                    entity_type: self.entity_type.clone(),
                    column: column.clone(),
                }),
            })
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
