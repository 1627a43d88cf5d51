//! Shared fixtures for localization tests.

#![allow(dead_code)]

use polyglot_db::{Connection, Database};
use polyglot_l10n::{L10n, L10nConfig, OperationContext};
use polyglot_model::{EntitySchema, FieldDef, Model, ModelRegistry, Record};
use polyglot_types::{LanguageCode, QueryMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Localizable, soft-deleted, with sync columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub quantity: i64,
    pub name: String,
    #[serde(default)]
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub language_code: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl Model for Product {
    const ENTITY_TYPE: &'static str = "product";

    fn schema() -> EntitySchema {
        EntitySchema::new(Self::ENTITY_TYPE, &["id"])
            .with_table("products")
            .with_fields([
                FieldDef::integer("id"),
                FieldDef::text("code").synced(),
                FieldDef::integer("quantity").synced(),
                FieldDef::text("name"),
                FieldDef::integer("brand_id").synced().nullable(),
            ])
            .localizable()
            .with_soft_delete("deleted_at")
    }
}

impl Product {
    pub fn new(id: i64, code: &str, quantity: i64, name: &str) -> Self {
        Self {
            id,
            code: code.into(),
            quantity,
            name: name.into(),
            brand_id: None,
            language_code: String::new(),
            deleted_at: None,
        }
    }
}

/// Localizable and creatable from any locale, no sync columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub language_code: String,
}

impl Model for Color {
    const ENTITY_TYPE: &'static str = "color";

    fn schema() -> EntitySchema {
        EntitySchema::new(Self::ENTITY_TYPE, &["id"])
            .with_table("colors")
            .with_fields([FieldDef::integer("id"), FieldDef::text("name")])
            .locale_creatable()
    }
}

/// Not localizable.
pub fn tag_schema() -> EntitySchema {
    EntitySchema::new("tag", &["id"])
        .with_table("tags")
        .with_fields([FieldDef::integer("id"), FieldDef::text("name")])
}

pub fn loc(code: &str) -> LanguageCode {
    LanguageCode::parse(code).unwrap()
}

pub fn global() -> LanguageCode {
    LanguageCode::default_global()
}

pub fn key(id: i64) -> Vec<Value> {
    vec![Value::from(id)]
}

pub fn in_locale(code: &str) -> OperationContext {
    OperationContext::in_locale(loc(code))
}

pub fn locale_mode(code: &str) -> OperationContext {
    in_locale(code).with_mode(QueryMode::Locale)
}

pub fn setup() -> (Database, L10n) {
    let db = Database::open_in_memory().unwrap();
    db.ensure_tables([&Product::schema(), &Color::schema(), &tag_schema()])
        .unwrap();

    let mut registry = ModelRegistry::new();
    registry.register_model::<Product>().unwrap();
    registry.register_model::<Color>().unwrap();
    registry.register(tag_schema()).unwrap();

    let config = L10nConfig::default().with_available_locales([global(), loc("zh"), loc("en")]);
    (db, L10n::new(config, registry))
}

/// Inserts a product under the global locale.
pub fn seed_product(conn: &Connection, l10n: &L10n, product: &Product) {
    l10n.insert_model(conn, &OperationContext::new(), product)
        .unwrap();
}

/// The live product row stored under exactly `locale`.
pub fn product_in(conn: &Connection, l10n: &L10n, id: i64, locale: &str) -> Option<Product> {
    l10n.find_model::<Product>(conn, &locale_mode(locale), &key(id))
        .unwrap()
}

/// Every stored product row, soft-deleted ones included.
pub fn all_rows(conn: &Connection, l10n: &L10n) -> Vec<Record> {
    l10n.find(
        conn,
        &OperationContext::unscoped(),
        Product::ENTITY_TYPE,
        polyglot_db::Query::new()
            .with_deleted()
            .order_asc("id")
            .order_asc("language_code"),
    )
    .unwrap()
}
