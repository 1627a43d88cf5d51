//! Entity model for Polyglot.
//!
//! Defines the types every other layer reads to understand a row:
//! - [`EntitySchema`]: an entity type's table, key, fields and capabilities
//! - [`FieldDef`]: a single column, optionally marked `sync`
//! - [`Record`]: the generic row container (entity type + JSON column values)
//! - [`Model`]: implemented by typed structs that map onto a schema
//! - [`ModelRegistry`]: resolves capabilities and sync columns once per type
//!
//! Localization is a capability declared on the schema, not detected at
//! runtime. A localizable schema gets an implicit `language_code` column that
//! joins its own key to form the composite primary key.

mod error;
mod record;
mod registry;
mod schema;

pub use error::{ModelError, ModelResult};
pub use record::{Model, Record};
pub use registry::{ColumnSpec, ModelMeta, ModelRegistry};
pub use schema::{EntitySchema, FieldDef, FieldType, LANGUAGE_CODE_COLUMN};
