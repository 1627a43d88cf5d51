use polyglot_db::value::{from_sql_value, to_sql_value};
use polyglot_db::{
    ColumnRef, Condition, Delete, Direction, Insert, OrderTerm, Projection, Query, Select, Update,
    col, quote_ident,
};
use polyglot_model::FieldType;
use pretty_assertions::assert_eq;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Value, json};

fn columns(names: &[&str]) -> Projection {
    Projection::Columns(names.iter().map(|n| (*n).to_string()).collect())
}

// ── Identifiers ─────────────────────────────────────────────────

#[test]
fn quote_ident_escapes_embedded_quotes() {
    assert_eq!(quote_ident("products"), "\"products\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

// ── SELECT rendering ────────────────────────────────────────────

#[test]
fn select_with_filter_order_and_limit() {
    let sql = Select::from_table("products", columns(&["id", "name"]))
        .filter(Condition::eq(col("code"), "A-1"))
        .order_by(OrderTerm::Column(col("id"), Direction::Asc))
        .limit(10)
        .to_sql();

    assert_eq!(
        sql.text,
        "SELECT \"id\", \"name\" FROM \"products\" WHERE \"code\" = ? ORDER BY \"id\" ASC LIMIT 10"
    );
    assert_eq!(sql.params, vec![SqlValue::Text("A-1".into())]);
}

#[test]
fn empty_column_list_selects_star() {
    let sql = Select::from_table("products", columns(&[])).to_sql();
    assert_eq!(sql.text, "SELECT * FROM \"products\"");
    assert!(sql.params.is_empty());
}

#[test]
fn distinct_projection() {
    let sql = Select::from_table("products", Projection::Distinct(vec!["language_code".into()]))
        .to_sql();
    assert_eq!(sql.text, "SELECT DISTINCT \"language_code\" FROM \"products\"");
}

#[test]
fn offset_without_limit_uses_unbounded_limit() {
    let query = Query::new().offset(5);
    let sql = Select::from_query("products", Projection::Count, query).to_sql();
    assert_eq!(sql.text, "SELECT COUNT(*) FROM \"products\" LIMIT -1 OFFSET 5");
}

#[test]
fn query_options_carry_into_select() {
    let query = Query::new()
        .filter(Condition::gt(col("quantity"), 3))
        .order_desc("quantity")
        .limit(2)
        .offset(4);
    let sql = Select::from_query("products", columns(&["id"]), query).to_sql();
    assert_eq!(
        sql.text,
        "SELECT \"id\" FROM \"products\" WHERE \"quantity\" > ? ORDER BY \"quantity\" DESC LIMIT 2 OFFSET 4"
    );
    assert_eq!(sql.params, vec![SqlValue::Integer(3)]);
}

// ── Conditions ──────────────────────────────────────────────────

#[test]
fn null_comparisons_render_is_null() {
    let sql = Select::from_table("t", Projection::One)
        .filter(Condition::eq(col("a"), Value::Null))
        .filter(Condition::ne(col("b"), Value::Null))
        .to_sql();
    assert_eq!(
        sql.text,
        "SELECT 1 FROM \"t\" WHERE \"a\" IS NULL AND \"b\" IS NOT NULL"
    );
    assert!(sql.params.is_empty());
}

#[test]
fn empty_in_list_matches_nothing() {
    let sql = Select::from_table("t", Projection::One)
        .filter(Condition::is_in(col("id"), Vec::<i64>::new()))
        .to_sql();
    assert_eq!(sql.text, "SELECT 1 FROM \"t\" WHERE 0");
}

#[test]
fn in_list_binds_each_value() {
    let sql = Select::from_table("t", Projection::One)
        .filter(Condition::is_in(col("id"), [1, 2, 3]))
        .to_sql();
    assert_eq!(sql.text, "SELECT 1 FROM \"t\" WHERE \"id\" IN (?, ?, ?)");
    assert_eq!(sql.params.len(), 3);
}

#[test]
fn nested_groups_are_parenthesized() {
    let sql = Select::from_table("t", Projection::One)
        .filter(Condition::Any(vec![
            Condition::eq(col("a"), 1),
            Condition::All(vec![Condition::eq(col("b"), 2), Condition::eq(col("c"), 3)]),
        ]))
        .filter(Condition::eq(col("d"), 4))
        .to_sql();
    assert_eq!(
        sql.text,
        "SELECT 1 FROM \"t\" WHERE (\"a\" = ? OR (\"b\" = ? AND \"c\" = ?)) AND \"d\" = ?"
    );
    assert_eq!(
        sql.params,
        vec![
            SqlValue::Integer(1),
            SqlValue::Integer(2),
            SqlValue::Integer(3),
            SqlValue::Integer(4),
        ]
    );
}

#[test]
fn correlated_not_exists_subquery() {
    let sibling = Select::from_table("products", Projection::One)
        .alias("sibling")
        .filter(Condition::ColumnsEqual(
            ColumnRef::qualified("sibling", "id"),
            ColumnRef::qualified("products", "id"),
        ))
        .filter(Condition::eq(ColumnRef::qualified("sibling", "language_code"), "zh"));

    let sql = Select::from_table("products", columns(&["id"]))
        .filter(Condition::not_exists(sibling))
        .to_sql();

    assert_eq!(
        sql.text,
        "SELECT \"id\" FROM \"products\" WHERE NOT EXISTS (SELECT 1 FROM \"products\" AS \"sibling\" \
         WHERE \"sibling\".\"id\" = \"products\".\"id\" AND \"sibling\".\"language_code\" = ?)"
    );
    assert_eq!(sql.params, vec![SqlValue::Text("zh".into())]);
}

#[test]
fn matches_order_term_binds_its_value() {
    let sql = Select::from_table("products", columns(&["id"]))
        .order_by(OrderTerm::Column(col("id"), Direction::Asc))
        .order_by(OrderTerm::Matches(col("language_code"), json!("zh"), Direction::Desc))
        .to_sql();
    assert_eq!(
        sql.text,
        "SELECT \"id\" FROM \"products\" ORDER BY \"id\" ASC, (\"language_code\" = ?) DESC"
    );
    assert_eq!(sql.params, vec![SqlValue::Text("zh".into())]);
}

#[test]
fn reference_name_prefers_alias() {
    let select = Select::from_table("products", Projection::One);
    assert_eq!(select.reference_name(), "products");
    assert_eq!(select.alias("p").reference_name(), "p");
}

// ── Write statements ────────────────────────────────────────────

#[test]
fn plain_insert() {
    let sql = Insert::new("products")
        .value("id", 1)
        .value("name", "Widget")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql.text,
        "INSERT INTO \"products\" (\"id\", \"name\") VALUES (?, ?)"
    );
    assert_eq!(
        sql.params,
        vec![SqlValue::Integer(1), SqlValue::Text("Widget".into())]
    );
}

#[test]
fn upsert_updates_non_key_columns() {
    let sql = Insert::new("products")
        .value("id", 1)
        .value("language_code", "zh")
        .value("name", "Widget")
        .upsert_on(&["id", "language_code"])
        .to_sql()
        .unwrap();
    assert_eq!(
        sql.text,
        "INSERT INTO \"products\" (\"id\", \"language_code\", \"name\") VALUES (?, ?, ?) \
         ON CONFLICT (\"id\", \"language_code\") DO UPDATE SET \"name\" = excluded.\"name\""
    );
}

#[test]
fn upsert_of_key_only_row_does_nothing_on_conflict() {
    let sql = Insert::new("tags")
        .value("id", 1)
        .upsert_on(&["id"])
        .to_sql()
        .unwrap();
    assert!(sql.text.ends_with("ON CONFLICT (\"id\") DO NOTHING"));
}

#[test]
fn empty_insert_is_rejected() {
    assert!(Insert::new("products").to_sql().is_err());
    assert!(
        Insert::new("products")
            .value("id", 1)
            .upsert_on(&[])
            .to_sql()
            .is_err()
    );
}

#[test]
fn update_renders_assignments_then_filter() {
    let sql = Update::new("products")
        .set("quantity", 9)
        .set("code", "A-1")
        .filter(Condition::eq(col("id"), 1))
        .filter(Condition::ne(col("language_code"), "zh"))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql.text,
        "UPDATE \"products\" SET \"quantity\" = ?, \"code\" = ? WHERE \"id\" = ? AND \"language_code\" <> ?"
    );
    assert_eq!(sql.params.len(), 4);
}

#[test]
fn update_without_assignments_is_rejected() {
    assert!(Update::new("products").to_sql().is_err());
}

#[test]
fn delete_with_and_without_filter() {
    assert_eq!(Delete::new("products").to_sql().text, "DELETE FROM \"products\"");
    let sql = Delete::new("products")
        .filter(Condition::eq(col("id"), 7))
        .to_sql();
    assert_eq!(sql.text, "DELETE FROM \"products\" WHERE \"id\" = ?");
}

// ── Value codec ─────────────────────────────────────────────────

#[test]
fn json_values_encode_to_sqlite_storage_classes() {
    assert_eq!(to_sql_value(&Value::Null), SqlValue::Null);
    assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
    assert_eq!(to_sql_value(&json!(42)), SqlValue::Integer(42));
    assert_eq!(to_sql_value(&json!(1.5)), SqlValue::Real(1.5));
    assert_eq!(to_sql_value(&json!("zh")), SqlValue::Text("zh".into()));
    assert_eq!(
        to_sql_value(&json!({"a": 1})),
        SqlValue::Text("{\"a\":1}".into())
    );
}

#[test]
fn declared_type_restores_shape() {
    assert_eq!(
        from_sql_value(ValueRef::Integer(0), FieldType::Bool).unwrap(),
        json!(false)
    );
    assert_eq!(
        from_sql_value(ValueRef::Text(b"[1,2]"), FieldType::Json).unwrap(),
        json!([1, 2])
    );
    assert_eq!(
        from_sql_value(ValueRef::Integer(3), FieldType::Real).unwrap(),
        json!(3.0)
    );
    assert_eq!(
        from_sql_value(ValueRef::Null, FieldType::Integer).unwrap(),
        Value::Null
    );
}

#[test]
fn malformed_json_column_is_an_error() {
    assert!(from_sql_value(ValueRef::Text(b"{nope"), FieldType::Json).is_err());
}
