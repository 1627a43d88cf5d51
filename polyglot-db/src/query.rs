//! Statement builder.
//!
//! Statements are plain data so the localization layer can inspect and
//! extend them before they are rendered. Rendering quotes every identifier and
//! binds every value; no caller-provided value is ever spliced into SQL text.

use crate::value::to_sql_value;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

/// Rendered SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sql {
    pub text: String,
    pub params: Vec<SqlValue>,
}

impl Sql {
    pub(crate) fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn bind(&mut self, value: &Value) {
        self.text.push('?');
        self.params.push(to_sql_value(value));
    }
}

/// Double-quotes an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: &str) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: &str, name: &str) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    fn render(&self, sql: &mut Sql) {
        if let Some(q) = &self.qualifier {
            sql.push(&quote_ident(q));
            sql.push(".");
        }
        sql.push(&quote_ident(&self.name));
    }
}

/// Shorthand for an unqualified column.
pub fn col(name: &str) -> ColumnRef {
    ColumnRef::new(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    const fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::Ne => " <> ",
            CompareOp::Lt => " < ",
            CompareOp::Le => " <= ",
            CompareOp::Gt => " > ",
            CompareOp::Ge => " >= ",
        }
    }
}

/// A boolean filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(ColumnRef, CompareOp, Value),
    In(ColumnRef, Vec<Value>),
    IsNull(ColumnRef),
    IsNotNull(ColumnRef),
    Like(ColumnRef, String),
    ColumnsEqual(ColumnRef, ColumnRef),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Exists(Box<Select>),
}

impl Condition {
    pub fn eq(column: ColumnRef, value: impl Into<Value>) -> Self {
        Condition::Compare(column, CompareOp::Eq, value.into())
    }

    pub fn ne(column: ColumnRef, value: impl Into<Value>) -> Self {
        Condition::Compare(column, CompareOp::Ne, value.into())
    }

    pub fn lt(column: ColumnRef, value: impl Into<Value>) -> Self {
        Condition::Compare(column, CompareOp::Lt, value.into())
    }

    pub fn gt(column: ColumnRef, value: impl Into<Value>) -> Self {
        Condition::Compare(column, CompareOp::Gt, value.into())
    }

    pub fn is_in<V: Into<Value>>(column: ColumnRef, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn not_exists(select: Select) -> Self {
        Condition::Not(Box::new(Condition::Exists(Box::new(select))))
    }

    fn render(&self, sql: &mut Sql) {
        match self {
            Condition::Compare(column, op, value) => {
                if value.is_null() {
                    // `= NULL` never matches; compare with IS instead.
                    column.render(sql);
                    sql.push(match op {
                        CompareOp::Ne => " IS NOT NULL",
                        _ => " IS NULL",
                    });
                    return;
                }
                column.render(sql);
                sql.push(op.as_sql());
                sql.bind(value);
            }
            Condition::In(column, values) => {
                if values.is_empty() {
                    sql.push("0");
                    return;
                }
                column.render(sql);
                sql.push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push(", ");
                    }
                    sql.bind(value);
                }
                sql.push(")");
            }
            Condition::IsNull(column) => {
                column.render(sql);
                sql.push(" IS NULL");
            }
            Condition::IsNotNull(column) => {
                column.render(sql);
                sql.push(" IS NOT NULL");
            }
            Condition::Like(column, pattern) => {
                column.render(sql);
                sql.push(" LIKE ");
                sql.bind(&Value::String(pattern.clone()));
            }
            Condition::ColumnsEqual(left, right) => {
                left.render(sql);
                sql.push(" = ");
                right.render(sql);
            }
            Condition::All(conditions) => render_joined(sql, conditions, " AND ", "1"),
            Condition::Any(conditions) => render_joined(sql, conditions, " OR ", "0"),
            Condition::Not(inner) => {
                sql.push("NOT ");
                inner.render_grouped(sql);
            }
            Condition::Exists(select) => {
                sql.push("EXISTS (");
                select.render(sql);
                sql.push(")");
            }
        }
    }

    fn render_grouped(&self, sql: &mut Sql) {
        match self {
            Condition::All(_) | Condition::Any(_) => {
                sql.push("(");
                self.render(sql);
                sql.push(")");
            }
            _ => self.render(sql),
        }
    }
}

fn render_joined(sql: &mut Sql, conditions: &[Condition], separator: &str, empty: &str) {
    if conditions.is_empty() {
        sql.push(empty);
        return;
    }
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push(separator);
        }
        condition.render_grouped(sql);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTerm {
    Column(ColumnRef, Direction),
    /// Orders by `column = value`, i.e. matching rows first when descending.
    Matches(ColumnRef, Value, Direction),
}

impl OrderTerm {
    fn render(&self, sql: &mut Sql) {
        let direction = match self {
            OrderTerm::Column(column, direction) => {
                column.render(sql);
                direction
            }
            OrderTerm::Matches(column, value, direction) => {
                sql.push("(");
                column.render(sql);
                sql.push(" = ");
                sql.bind(value);
                sql.push(")");
                direction
            }
        };
        sql.push(match direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }
}

/// What a SELECT returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<String>),
    Distinct(Vec<String>),
    /// `SELECT 1`, for existence subqueries.
    One,
    Count,
}

/// Caller-side query options, independent of any table.
///
/// The localization layer turns a `Query` into a [`Select`] for a concrete
/// entity and then appends its own locale conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Include soft-deleted rows.
    pub with_deleted: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(OrderTerm::Column(col(column), Direction::Asc));
        self
    }

    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(OrderTerm::Column(col(column), Direction::Desc));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }
}

/// A SELECT statement against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub alias: Option<String>,
    pub projection: Projection,
    /// ANDed together.
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Select {
    pub fn from_table(table: &str, projection: Projection) -> Self {
        Self {
            table: table.into(),
            alias: None,
            projection,
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Applies caller-side query options.
    pub fn from_query(table: &str, projection: Projection, query: Query) -> Self {
        Self {
            table: table.into(),
            alias: None,
            projection,
            conditions: query.conditions,
            order: query.order,
            limit: query.limit,
            offset: query.offset,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order.push(term);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Name the table is referred to by inside this statement.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn to_sql(&self) -> Sql {
        let mut sql = Sql::default();
        self.render(&mut sql);
        sql
    }

    fn render(&self, sql: &mut Sql) {
        sql.push("SELECT ");
        match &self.projection {
            Projection::Columns(columns) => render_column_list(sql, columns),
            Projection::Distinct(columns) => {
                sql.push("DISTINCT ");
                render_column_list(sql, columns);
            }
            Projection::One => sql.push("1"),
            Projection::Count => sql.push("COUNT(*)"),
        }
        sql.push(" FROM ");
        sql.push(&quote_ident(&self.table));
        if let Some(alias) = &self.alias {
            sql.push(" AS ");
            sql.push(&quote_ident(alias));
        }
        render_where(sql, &self.conditions);
        if !self.order.is_empty() {
            sql.push(" ORDER BY ");
            for (i, term) in self.order.iter().enumerate() {
                if i > 0 {
                    sql.push(", ");
                }
                term.render(sql);
            }
        }
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                sql.push(&format!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    sql.push(&format!(" OFFSET {offset}"));
                }
            }
            // SQLite requires a LIMIT before OFFSET.
            (None, Some(offset)) => sql.push(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
    }
}

fn render_column_list(sql: &mut Sql, columns: &[String]) {
    if columns.is_empty() {
        sql.push("*");
        return;
    }
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    sql.push(&quoted.join(", "));
}

pub(crate) fn render_where(sql: &mut Sql, conditions: &[Condition]) {
    if conditions.is_empty() {
        return;
    }
    sql.push(" WHERE ");
    render_joined(sql, conditions, " AND ", "1");
}
