//! SQLite access for Polyglot.
//!
//! Provides:
//! - [`Database`] / [`DbConfig`]: connection opening and pragmas
//! - a statement builder ([`Select`], [`Insert`], [`Update`], [`Delete`],
//!   [`Condition`], [`Query`]) whose statements stay inspectable until
//!   rendered
//! - execution helpers that borrow a `rusqlite::Connection`, so they run
//!   inside whatever transaction the caller holds
//! - [`with_savepoint`] for nested atomic units
//!
//! Values travel as `serde_json::Value` and are converted at the binding
//! boundary by the [`value`] codec.

mod connection;
mod error;
mod exec;
mod query;
mod statement;
pub mod value;

pub use connection::{Database, DbConfig, create_table, create_table_sql};
pub use error::{DbError, DbResult};
pub use exec::{execute, exists, fetch, fetch_column, fetch_dynamic, with_savepoint};
pub use query::{
    ColumnRef, CompareOp, Condition, Direction, OrderTerm, Projection, Query, Select, Sql, col,
    quote_ident,
};
pub use statement::{Delete, Insert, OnConflict, Update};

/// Re-exported so callers can name connections and transactions without a
/// direct `rusqlite` dependency.
pub use rusqlite::{Connection, Transaction};
