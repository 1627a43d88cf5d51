mod common;

use common::{Color, Product, global, in_locale, loc, tag_schema};
use polyglot_db::value::to_sql_value;
use polyglot_db::{Projection, Query, Select, Sql};
use polyglot_l10n::rewrite::{
    base_select, plan_delete, plan_insert, plan_update, scope_publish, scope_select,
};
use polyglot_l10n::{LocaleResolver, OperationContext, WriteAction, WritePlan};
use polyglot_model::{Model, ModelMeta, ModelRegistry, Record};
use polyglot_types::QueryMode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

struct Metas {
    product: Arc<ModelMeta>,
    color: Arc<ModelMeta>,
    tag: Arc<ModelMeta>,
}

fn metas() -> Metas {
    let mut registry = ModelRegistry::new();
    Metas {
        product: registry.register_model::<Product>().unwrap(),
        color: registry.register_model::<Color>().unwrap(),
        tag: registry.register(tag_schema()).unwrap(),
    }
}

fn resolver() -> LocaleResolver {
    LocaleResolver::new(global())
}

fn params(values: &[&str]) -> Vec<polyglot_db::value::SqlValue> {
    values.iter().map(|v| to_sql_value(&json!(v))).collect()
}

fn scoped(meta: &ModelMeta, ctx: &OperationContext) -> Sql {
    scope_select(Some(meta), base_select(meta, Query::new()), ctx, &resolver()).to_sql()
}

// ── Read scoping ────────────────────────────────────────────────

#[test]
fn base_select_hides_soft_deleted_rows() {
    let m = metas();
    let sql = base_select(&m.product, Query::new()).to_sql();
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL"
    );

    let sql = base_select(&m.product, Query::new().with_deleted()).to_sql();
    assert_eq!(sql.text, "SELECT * FROM \"products\"");
}

#[test]
fn unscoped_adds_no_locale_filter() {
    let m = metas();
    let sql = scoped(&m.product, &in_locale("zh").with_mode(QueryMode::Unscoped));
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL"
    );
}

#[test]
fn locale_mode_pins_query_locale() {
    let m = metas();
    let sql = scoped(&m.product, &in_locale("zh").with_mode(QueryMode::Locale));
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL \
         AND \"products\".\"language_code\" = ?"
    );
    assert_eq!(sql.params, params(&["zh"]));
}

#[test]
fn global_mode_pins_global_locale() {
    let m = metas();
    let sql = scoped(&m.product, &in_locale("zh").with_mode(QueryMode::Global));
    assert_eq!(sql.params, params(&["en-US"]));
}

#[test]
fn fallback_in_global_locale_is_a_plain_filter() {
    let m = metas();
    let sql = scoped(&m.product, &OperationContext::new());
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL \
         AND \"products\".\"language_code\" = ?"
    );
    assert_eq!(sql.params, params(&["en-US"]));
}

#[test]
fn fallback_prefers_locale_row_and_dedupes_global() {
    let m = metas();
    let sql = scoped(&m.product, &in_locale("zh"));
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL \
         AND (\"products\".\"language_code\" = ? OR (\"products\".\"language_code\" = ? \
         AND NOT EXISTS (SELECT 1 FROM \"products\" AS \"l10n_sibling\" \
         WHERE \"l10n_sibling\".\"id\" = \"products\".\"id\" \
         AND \"l10n_sibling\".\"language_code\" = ? \
         AND \"l10n_sibling\".\"deleted_at\" IS NULL))) \
         ORDER BY (\"products\".\"language_code\" = ?) DESC"
    );
    assert_eq!(sql.params, params(&["zh", "en-US", "zh", "zh"]));
}

#[test]
fn fallback_order_term_follows_caller_order() {
    let m = metas();
    let select = base_select(&m.product, Query::new().order_desc("quantity"));
    let sql = scope_select(Some(&*m.product), select, &in_locale("zh"), &resolver()).to_sql();
    assert!(
        sql.text
            .ends_with("ORDER BY \"quantity\" DESC, (\"products\".\"language_code\" = ?) DESC")
    );
}

#[test]
fn reverse_lists_global_rows_missing_a_translation() {
    let m = metas();
    let sql = scoped(&m.product, &in_locale("zh").with_mode(QueryMode::Reverse));
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL \
         AND \"products\".\"language_code\" = ? \
         AND NOT EXISTS (SELECT 1 FROM \"products\" AS \"l10n_sibling\" \
         WHERE \"l10n_sibling\".\"id\" = \"products\".\"id\" \
         AND \"l10n_sibling\".\"language_code\" = ? \
         AND \"l10n_sibling\".\"deleted_at\" IS NULL)"
    );
    assert_eq!(sql.params, params(&["en-US", "zh"]));
}

#[test]
fn aliased_select_correlates_on_alias() {
    let m = metas();
    let select = Select::from_table("products", Projection::One).alias("p");
    let sql = scope_select(Some(&*m.product), select, &in_locale("zh"), &resolver()).to_sql();
    assert!(sql.text.contains("\"p\".\"language_code\" = ?"));
    assert!(sql.text.contains("\"l10n_sibling\".\"id\" = \"p\".\"id\""));
}

#[test]
fn non_localizable_and_unknown_entities_pass_through() {
    let m = metas();
    let select = base_select(&m.tag, Query::new());
    let scoped = scope_select(Some(&*m.tag), select.clone(), &in_locale("zh"), &resolver());
    assert_eq!(scoped, select);

    let raw = Select::from_table("anything", Projection::Count);
    assert_eq!(
        scope_select(None, raw.clone(), &in_locale("zh"), &resolver()),
        raw
    );
}

#[test]
fn entity_without_soft_delete_has_no_deleted_filter_in_sibling() {
    let m = metas();
    let sql = scoped(&m.color, &in_locale("zh"));
    assert!(!sql.text.contains("deleted_at"));
    assert!(sql.text.contains("NOT EXISTS"));
}

// ── Insert planning ─────────────────────────────────────────────

fn record() -> Record {
    Record::new(Product::ENTITY_TYPE).with("id", 1)
}

#[test]
fn non_creatable_entity_is_forced_to_global() {
    let m = metas();
    let plan = plan_insert(Some(&*m.product), &record(), &in_locale("zh"), &resolver()).unwrap();
    assert_eq!(
        plan,
        WritePlan {
            locale: Some(global()),
            action: WriteAction::Insert,
            propagate_sync: true,
        }
    );
}

#[test]
fn creatable_entity_keeps_write_locale() {
    let m = metas();
    let color = Record::new(Color::ENTITY_TYPE).with("id", 1);
    let plan = plan_insert(Some(&*m.color), &color, &in_locale("zh"), &resolver()).unwrap();
    assert_eq!(plan.locale, Some(loc("zh")));

    let redirected = in_locale("zh").localize_to(loc("en"));
    let plan = plan_insert(Some(&*m.color), &color, &redirected, &resolver()).unwrap();
    assert_eq!(plan.locale, Some(loc("en")));
}

#[test]
fn explicit_modes_pick_their_locale_without_sync() {
    let m = metas();
    let locale = plan_insert(
        Some(&*m.product),
        &record(),
        &in_locale("zh").with_mode(QueryMode::Locale),
        &resolver(),
    )
    .unwrap();
    assert_eq!(locale.locale, Some(loc("zh")));
    assert!(!locale.propagate_sync);

    let global_mode = plan_insert(
        Some(&*m.product),
        &record(),
        &in_locale("zh").with_mode(QueryMode::Global),
        &resolver(),
    )
    .unwrap();
    assert_eq!(global_mode.locale, Some(global()));
    assert!(!global_mode.propagate_sync);
}

#[test]
fn unscoped_insert_keeps_record_locale() {
    let m = metas();
    let ctx = OperationContext::unscoped();
    let with_locale = record().with("language_code", "zh");
    let plan = plan_insert(Some(&*m.product), &with_locale, &ctx, &resolver()).unwrap();
    assert_eq!(plan.locale, Some(loc("zh")));

    let blank = record().with("language_code", "");
    let plan = plan_insert(Some(&*m.product), &blank, &ctx, &resolver()).unwrap();
    assert_eq!(plan.locale, Some(global()));

    let invalid = record().with("language_code", "not a code");
    assert!(plan_insert(Some(&*m.product), &invalid, &ctx, &resolver()).is_err());
}

#[test]
fn non_localizable_insert_has_no_locale() {
    let m = metas();
    let tag = Record::new("tag").with("id", 1);
    let plan = plan_insert(Some(&*m.tag), &tag, &in_locale("zh"), &resolver()).unwrap();
    assert_eq!(plan.locale, None);
    assert!(!plan.propagate_sync);
}

// ── Update planning ─────────────────────────────────────────────

#[test]
fn default_update_targets_write_locale_and_creates_missing() {
    let m = metas();
    let zh = loc("zh");
    let plan = plan_update(Some(&*m.product), Some(&zh), &in_locale("zh"), &resolver());
    assert_eq!(
        plan,
        WritePlan {
            locale: Some(zh),
            action: WriteAction::Update {
                create_missing: true
            },
            propagate_sync: true,
        }
    );

    let plan = plan_update(Some(&*m.product), Some(&global()), &OperationContext::new(), &resolver());
    assert_eq!(
        plan.action,
        WriteAction::Update {
            create_missing: false
        }
    );
}

#[test]
fn differing_localize_target_becomes_copy_write() {
    let m = metas();
    let ctx = OperationContext::new().localize_to(loc("zh"));
    let plan = plan_update(Some(&*m.product), Some(&global()), &ctx, &resolver());
    assert_eq!(plan.locale, Some(loc("zh")));
    assert_eq!(plan.action, WriteAction::Upsert);

    // Already loaded from the target: a plain update.
    let plan = plan_update(Some(&*m.product), Some(&loc("zh")), &ctx, &resolver());
    assert_eq!(
        plan.action,
        WriteAction::Update {
            create_missing: true
        }
    );
}

#[test]
fn unscoped_update_addresses_record_locale_only() {
    let m = metas();
    let zh = loc("zh");
    let ctx = OperationContext::unscoped().localize_to(loc("en"));
    let plan = plan_update(Some(&*m.product), Some(&zh), &ctx, &resolver());
    assert_eq!(plan.locale, Some(zh));
    assert!(plan.propagate_sync);

    let plan = plan_update(Some(&*m.product), None, &ctx, &resolver());
    assert_eq!(plan.locale, None);
    assert!(!plan.propagate_sync);
}

// ── Publish scoping ─────────────────────────────────────────────

#[test]
fn publish_listing_limits_to_publishable_locales() {
    let m = metas();
    let publishable = [global(), loc("zh")];
    let select = base_select(&m.product, Query::new());
    let sql = scope_publish(Some(&*m.product), select, None, &publishable, &resolver()).to_sql();
    assert_eq!(
        sql.text,
        "SELECT * FROM \"products\" WHERE \"products\".\"deleted_at\" IS NULL \
         AND \"products\".\"language_code\" IN (?, ?)"
    );
    assert_eq!(sql.params, params(&["en-US", "zh"]));
}

#[test]
fn publish_listing_in_one_locale_is_a_locale_read() {
    let m = metas();
    let select = base_select(&m.product, Query::new());
    let sql = scope_publish(Some(&*m.product), select, Some(&loc("zh")), &[global()], &resolver())
        .to_sql();
    assert_eq!(sql, scoped(&m.product, &in_locale("zh").with_mode(QueryMode::Locale)));
}

#[test]
fn publish_listing_leaves_plain_tables_alone() {
    let m = metas();
    let select = Select::from_table("tags", Projection::One);
    let sql = scope_publish(Some(&*m.tag), select.clone(), None, &[global()], &resolver());
    assert_eq!(sql.to_sql().text, select.to_sql().text);
}

// ── Delete planning ─────────────────────────────────────────────

#[test]
fn delete_scope_by_mode() {
    let m = metas();
    let r = resolver();
    assert_eq!(plan_delete(Some(&*m.product), &in_locale("zh"), &r), Some(loc("zh")));
    assert_eq!(
        plan_delete(Some(&*m.product), &in_locale("zh").with_mode(QueryMode::Global), &r),
        Some(global())
    );
    assert_eq!(
        plan_delete(Some(&*m.product), &in_locale("zh").with_mode(QueryMode::Unscoped), &r),
        None
    );
    assert_eq!(plan_delete(Some(&*m.tag), &in_locale("zh"), &r), None);
    assert_eq!(plan_delete(None, &in_locale("zh"), &r), None);
}
