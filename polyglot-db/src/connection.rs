//! Connection management.

use crate::DbResult;
use crate::query::quote_ident;
use polyglot_model::{EntitySchema, LANGUAGE_CODE_COLUMN};
use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings, usually read from the `[database]` table of a config
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_foreign_keys() -> bool {
    true
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            foreign_keys: default_foreign_keys(),
        }
    }
}

/// An owned SQLite connection.
///
/// The localization core never opens connections itself; it borrows the one
/// held here (or a transaction started from it).
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>, config: &DbConfig) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_config(config)?;
        info!("Opened database at {:?}", path);
        Ok(db)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.apply_config(&DbConfig::default())?;
        Ok(db)
    }

    fn apply_config(&self, config: &DbConfig) -> DbResult<()> {
        self.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        self.conn
            .pragma_update(None, "foreign_keys", config.foreign_keys)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Starts a transaction. Dropping it without commit rolls back.
    pub fn transaction(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Creates tables for the given schemas if they do not exist yet.
    pub fn ensure_tables<'a>(&self, schemas: impl IntoIterator<Item = &'a EntitySchema>) -> DbResult<()> {
        for schema in schemas {
            create_table(&self.conn, schema)?;
        }
        Ok(())
    }
}

/// DDL for an entity's table.
///
/// Localizable tables get a `language_code` column and a composite primary
/// key of the entity key plus the language code.
pub fn create_table_sql(schema: &EntitySchema) -> String {
    let mut columns: Vec<String> = schema
        .fields
        .iter()
        .map(|f| {
            let null = if f.nullable { "" } else { " NOT NULL" };
            format!("{} {}{}", quote_ident(&f.name), f.field_type.sql_type(), null)
        })
        .collect();
    if schema.localizable {
        columns.push(format!("{} TEXT NOT NULL", quote_ident(LANGUAGE_CODE_COLUMN)));
    }
    if let Some(column) = &schema.soft_delete {
        columns.push(format!("{} TEXT", quote_ident(column)));
    }
    let key: Vec<String> = schema.key_columns().iter().map(|c| quote_ident(c)).collect();
    columns.push(format!("PRIMARY KEY ({})", key.join(", ")));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(schema.table_name()),
        columns.join(",\n    ")
    )
}

/// Creates the entity's table if it does not exist.
pub fn create_table(conn: &Connection, schema: &EntitySchema) -> DbResult<()> {
    let sql = create_table_sql(schema);
    debug!(table = schema.table_name(), "ensuring table");
    conn.execute_batch(&sql)?;
    Ok(())
}
