//! INSERT, UPDATE and DELETE statements.

use crate::query::{Condition, Sql, quote_ident, render_where};
use crate::{DbError, DbResult};
use serde_json::Value;

/// Behavior when an INSERT hits an existing key.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OnConflict {
    /// Fail with a constraint violation.
    #[default]
    Abort,
    /// Overwrite every non-key column of the existing row.
    Upsert { key: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub values: Vec<(String, Value)>,
    pub on_conflict: OnConflict,
}

impl Insert {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
            on_conflict: OnConflict::Abort,
        }
    }

    #[must_use]
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn upsert_on(mut self, key: &[&str]) -> Self {
        self.on_conflict = OnConflict::Upsert {
            key: key.iter().map(|c| (*c).to_string()).collect(),
        };
        self
    }

    pub fn to_sql(&self) -> DbResult<Sql> {
        if self.values.is_empty() {
            return Err(DbError::InvalidStatement(format!(
                "insert into {} has no values",
                self.table
            )));
        }

        let mut sql = Sql::default();
        sql.push("INSERT INTO ");
        sql.push(&quote_ident(&self.table));
        sql.push(" (");
        let columns: Vec<String> = self.values.iter().map(|(c, _)| quote_ident(c)).collect();
        sql.push(&columns.join(", "));
        sql.push(") VALUES (");
        for (i, (_, value)) in self.values.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.bind(value);
        }
        sql.push(")");

        if let OnConflict::Upsert { key } = &self.on_conflict {
            if key.is_empty() {
                return Err(DbError::InvalidStatement(format!(
                    "upsert into {} has no conflict key",
                    self.table
                )));
            }
            let target: Vec<String> = key.iter().map(|c| quote_ident(c)).collect();
            sql.push(" ON CONFLICT (");
            sql.push(&target.join(", "));
            sql.push(")");

            let updates: Vec<String> = self
                .values
                .iter()
                .filter(|(c, _)| !key.contains(c))
                .map(|(c, _)| format!("{q} = excluded.{q}", q = quote_ident(c)))
                .collect();
            if updates.is_empty() {
                sql.push(" DO NOTHING");
            } else {
                sql.push(" DO UPDATE SET ");
                sql.push(&updates.join(", "));
            }
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub conditions: Vec<Condition>,
}

impl Update {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn to_sql(&self) -> DbResult<Sql> {
        if self.assignments.is_empty() {
            return Err(DbError::InvalidStatement(format!(
                "update of {} has no assignments",
                self.table
            )));
        }

        let mut sql = Sql::default();
        sql.push("UPDATE ");
        sql.push(&quote_ident(&self.table));
        sql.push(" SET ");
        for (i, (column, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push(&quote_ident(column));
            sql.push(" = ");
            sql.bind(value);
        }
        render_where(&mut sql, &self.conditions);
        Ok(sql)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub conditions: Vec<Condition>,
}

impl Delete {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn to_sql(&self) -> Sql {
        let mut sql = Sql::default();
        sql.push("DELETE FROM ");
        sql.push(&quote_ident(&self.table));
        render_where(&mut sql, &self.conditions);
        sql
    }
}
