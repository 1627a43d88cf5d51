use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the implicit locale column carried by every localizable table.
pub const LANGUAGE_CODE_COLUMN: &str = "language_code";

/// Describes an entity type: where it is stored, how it is keyed, which
/// columns it has and whether it participates in localization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    /// Table name. Defaults to the entity type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// The entity's own key columns, excluding `language_code`.
    pub primary_key: Vec<String>,
    pub fields: Vec<FieldDef>,
    /// Rows carry per-language variants keyed by `language_code`.
    #[serde(default)]
    pub localizable: bool,
    /// Rows may be created directly under a non-global locale.
    #[serde(default)]
    pub locale_creatable: bool,
    /// Nullable timestamp column marking soft-deleted rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete: Option<String>,
}

/// A column of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Value must be identical across all locale rows of one entity.
    #[serde(default)]
    pub sync: bool,
    #[serde(default)]
    pub nullable: bool,
}

impl FieldDef {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            sync: false,
            nullable: false,
        }
    }

    /// Shorthand for a text column.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for an integer column.
    pub fn integer(name: &str) -> Self {
        Self::simple(name, FieldType::Integer)
    }

    /// Shorthand for a floating point column.
    pub fn real(name: &str) -> Self {
        Self::simple(name, FieldType::Real)
    }

    /// Shorthand for a boolean column (stored as 0/1).
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Shorthand for a JSON column (stored as text).
    pub fn json(name: &str) -> Self {
        Self::simple(name, FieldType::Json)
    }

    /// Marks the column as synced across locales.
    #[must_use]
    pub fn synced(mut self) -> Self {
        self.sync = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Bool,
    Json,
}

impl FieldType {
    /// SQLite column affinity used in DDL.
    #[must_use]
    pub const fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Json => "TEXT",
            FieldType::Integer | FieldType::Bool => "INTEGER",
            FieldType::Real => "REAL",
        }
    }
}

impl EntitySchema {
    /// Creates a non-localizable schema with the given key columns and no
    /// fields. Key columns still have to be declared with [`with_field`].
    ///
    /// [`with_field`]: EntitySchema::with_field
    pub fn new(entity_type: &str, primary_key: &[&str]) -> Self {
        Self {
            entity_type: entity_type.into(),
            table: None,
            primary_key: primary_key.iter().map(|c| (*c).to_string()).collect(),
            fields: Vec::new(),
            localizable: false,
            locale_creatable: false,
            soft_delete: None,
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Enables per-language rows.
    #[must_use]
    pub fn localizable(mut self) -> Self {
        self.localizable = true;
        self
    }

    /// Enables per-language rows and direct creation under any locale.
    #[must_use]
    pub fn locale_creatable(mut self) -> Self {
        self.localizable = true;
        self.locale_creatable = true;
        self
    }

    /// Enables soft deletion through the named timestamp column.
    #[must_use]
    pub fn with_soft_delete(mut self, column: &str) -> Self {
        self.soft_delete = Some(column.into());
        self
    }

    /// The table rows are stored in.
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.entity_type)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sync-marked columns in declaration order.
    pub fn sync_columns(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.sync)
            .map(|f| f.name.as_str())
    }

    /// Full primary key: the entity key plus `language_code` when localizable.
    pub fn key_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.primary_key.iter().map(String::as_str).collect();
        if self.localizable {
            columns.push(LANGUAGE_CODE_COLUMN);
        }
        columns
    }

    /// Checks the declaration for inconsistencies.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |reason: String| ModelError::InvalidSchema {
            entity_type: self.entity_type.clone(),
            reason,
        };

        if self.entity_type.trim().is_empty() {
            return Err(invalid("entity type must not be empty".into()));
        }
        if self.primary_key.is_empty() {
            return Err(invalid("primary key must name at least one column".into()));
        }
        if self.locale_creatable && !self.localizable {
            return Err(invalid("locale_creatable requires localizable".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_identifier(&field.name) {
                return Err(invalid(format!("invalid column name {:?}", field.name)));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate column {}", field.name)));
            }
            if field.name == LANGUAGE_CODE_COLUMN {
                return Err(invalid(format!(
                    "{LANGUAGE_CODE_COLUMN} is implicit and must not be declared"
                )));
            }
        }

        for key in &self.primary_key {
            let field = self
                .field(key)
                .ok_or_else(|| invalid(format!("key column {key} is not declared")))?;
            if field.sync {
                return Err(invalid(format!("key column {key} cannot be marked sync")));
            }
            if field.nullable {
                return Err(invalid(format!("key column {key} cannot be nullable")));
            }
        }

        if let Some(column) = &self.soft_delete {
            if !is_identifier(column) {
                return Err(invalid(format!("invalid soft delete column {column:?}")));
            }
            if seen.contains(column.as_str()) || column == LANGUAGE_CODE_COLUMN {
                return Err(invalid(format!(
                    "soft delete column {column} collides with a declared column"
                )));
            }
        }

        if !is_identifier(self.table_name()) {
            return Err(invalid(format!("invalid table name {:?}", self.table_name())));
        }

        Ok(())
    }
}

/// Column and table names are interpolated into SQL, so only plain
/// identifiers are accepted.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
