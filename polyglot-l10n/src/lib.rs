//! Localization layer for Polyglot.
//!
//! Rows of a localizable entity exist once per language code. The columns an
//! entity marks `sync` hold a single value per logical entity; every other
//! column varies by locale. This crate keeps both promises on top of the
//! statement builder in `polyglot-db`:
//!
//! - [`OperationContext`] / [`LocaleResolver`]: which locale a statement
//!   reads and writes
//! - [`rewrite`]: locale filters for reads and [`WritePlan`]s for writes,
//!   chosen by [`QueryMode`](polyglot_types::QueryMode)
//! - [`sync`]: copies sync columns to sibling locale rows after a write
//! - [`LocalizeRequest`]: copies entities from one locale to others
//! - [`L10n`]: the facade tying these to a connection
//! - [`RequestParams`] and [`LocaleAccessPolicy`]: request-to-context mapping
//!   and locale permissions for admin front ends
//!
//! ```no_run
//! use polyglot_db::Database;
//! use polyglot_l10n::{L10n, L10nConfig, OperationContext};
//! use polyglot_model::{EntitySchema, FieldDef, ModelRegistry, Record};
//! use polyglot_types::LanguageCode;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = EntitySchema::new("product", &["id"])
//!     .with_fields([FieldDef::integer("id"), FieldDef::integer("quantity").synced()])
//!     .localizable();
//! let db = Database::open_in_memory()?;
//! db.ensure_tables([&schema])?;
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(schema)?;
//! let l10n = L10n::new(L10nConfig::default(), registry);
//!
//! let product = Record::new("product").with("id", 1).with("quantity", 3);
//! l10n.insert(db.connection(), &OperationContext::new(), &product)?;
//!
//! let zh = OperationContext::in_locale(LanguageCode::parse("zh")?);
//! let visible = l10n.find_by_key(db.connection(), &zh, "product", &[1.into()])?;
//! assert!(visible.is_some());
//! # Ok(())
//! # }
//! ```

mod access;
mod config;
mod context;
mod engine;
mod error;
mod localize;
mod request;
pub mod rewrite;
mod rows;
pub mod sync;

pub use access::{Anonymous, LocaleAccess, LocaleAccessPolicy};
pub use config::L10nConfig;
pub use context::{LocaleResolver, OperationContext, ResolvedLocale};
pub use engine::{L10n, WriteOutcome};
pub use error::{L10nError, L10nResult};
pub use localize::LocalizeRequest;
pub use request::{Method, RequestParams};
pub use rewrite::{WriteAction, WritePlan};
