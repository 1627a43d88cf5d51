use crate::{EntitySchema, FieldType, LANGUAGE_CODE_COLUMN, Model, ModelError, ModelResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Name and storage type of a physical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub field_type: FieldType,
}

/// Metadata resolved once when a schema is registered.
///
/// Holds the capability flags and the derived column lists so that the
/// interception layer never has to walk the schema on the hot path.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    schema: EntitySchema,
    sync_columns: Vec<String>,
    columns: Vec<ColumnSpec>,
}

impl ModelMeta {
    fn resolve(schema: EntitySchema) -> Self {
        let sync_columns = if schema.localizable {
            schema.sync_columns().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        let mut columns: Vec<ColumnSpec> = schema
            .fields
            .iter()
            .map(|f| ColumnSpec {
                name: f.name.clone(),
                field_type: f.field_type,
            })
            .collect();
        if schema.localizable {
            columns.push(ColumnSpec {
                name: LANGUAGE_CODE_COLUMN.into(),
                field_type: FieldType::Text,
            });
        }
        if let Some(column) = &schema.soft_delete {
            columns.push(ColumnSpec {
                name: column.clone(),
                field_type: FieldType::Text,
            });
        }

        Self {
            schema,
            sync_columns,
            columns,
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn entity_type(&self) -> &str {
        &self.schema.entity_type
    }

    pub fn table(&self) -> &str {
        self.schema.table_name()
    }

    pub fn is_localizable(&self) -> bool {
        self.schema.localizable
    }

    pub fn is_locale_creatable(&self) -> bool {
        self.schema.locale_creatable
    }

    /// Sync columns in declaration order. Always empty for non-localizable
    /// entities.
    pub fn sync_columns(&self) -> &[String] {
        &self.sync_columns
    }

    /// The entity's own key columns, excluding `language_code`.
    pub fn identity_columns(&self) -> &[String] {
        &self.schema.primary_key
    }

    /// Every physical column, implicit ones included.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.schema.soft_delete.as_deref()
    }
}

/// Registry of entity types and their capabilities.
///
/// Unknown entity types are simply absent; callers treat a missing entry as
/// "not localizable" rather than as an error.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    by_type: HashMap<String, Arc<ModelMeta>>,
    by_table: HashMap<String, String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a schema.
    pub fn register(&mut self, schema: EntitySchema) -> ModelResult<Arc<ModelMeta>> {
        schema.validate()?;
        if self.by_type.contains_key(&schema.entity_type) {
            return Err(ModelError::DuplicateEntity(schema.entity_type));
        }
        if let Some(owner) = self.by_table.get(schema.table_name()) {
            return Err(ModelError::InvalidSchema {
                entity_type: schema.entity_type.clone(),
                reason: format!("table {} is already used by {owner}", schema.table_name()),
            });
        }

        let meta = Arc::new(ModelMeta::resolve(schema));
        self.by_table
            .insert(meta.table().to_string(), meta.entity_type().to_string());
        self.by_type
            .insert(meta.entity_type().to_string(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Registers a typed model's schema.
    pub fn register_model<T: Model>(&mut self) -> ModelResult<Arc<ModelMeta>> {
        self.register(T::schema())
    }

    pub fn get(&self, entity_type: &str) -> Option<Arc<ModelMeta>> {
        self.by_type.get(entity_type).cloned()
    }

    pub fn by_table(&self, table: &str) -> Option<Arc<ModelMeta>> {
        self.by_table
            .get(table)
            .and_then(|entity_type| self.get(entity_type))
    }

    pub fn is_localizable(&self, entity_type: &str) -> bool {
        self.by_type
            .get(entity_type)
            .is_some_and(|meta| meta.is_localizable())
    }

    pub fn is_locale_creatable(&self, entity_type: &str) -> bool {
        self.by_type
            .get(entity_type)
            .is_some_and(|meta| meta.is_locale_creatable())
    }

    /// Sync columns of an entity type; empty for unknown types.
    pub fn sync_columns(&self, entity_type: &str) -> &[String] {
        self.by_type
            .get(entity_type)
            .map(|meta| meta.sync_columns())
            .unwrap_or(&[])
    }

    /// Registered entity types, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
