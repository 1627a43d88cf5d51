//! Query rewrite engine.
//!
//! Reads get a locale filter chosen by the operation's [`QueryMode`]:
//!
//! | mode       | rows returned                                                    |
//! |------------|------------------------------------------------------------------|
//! | `unscoped` | every locale                                                     |
//! | `locale`   | the query locale only                                            |
//! | `global`   | the global locale only                                           |
//! | `reverse`  | global rows with no live row in the query locale                 |
//! | `fallback` | the query locale, plus global rows where the query locale has none |
//!
//! Writes get a [`WritePlan`] naming the target locale, the kind of statement
//! and whether sync columns propagate afterwards.
//!
//! Every function takes `Option<&ModelMeta>`: unknown and non-localizable
//! entities pass through unchanged.

use crate::context::{LocaleResolver, OperationContext};
use crate::rows::{live_condition, locale_condition};
use crate::L10nResult;
use polyglot_db::{ColumnRef, Condition, Direction, OrderTerm, Projection, Query, Select};
use polyglot_model::{LANGUAGE_CODE_COLUMN, ModelMeta, Record};
use polyglot_types::{LanguageCode, QueryMode};
use serde_json::Value;
use tracing::debug;

/// Alias of the correlated subquery that looks for a sibling locale row.
pub const SIBLING_ALIAS: &str = "l10n_sibling";

fn localizable(meta: Option<&ModelMeta>) -> Option<&ModelMeta> {
    meta.filter(|m| m.is_localizable())
}

/// A SELECT of every physical column, with the caller's query options and
/// the soft-delete filter applied. No locale scoping yet.
pub fn base_select(meta: &ModelMeta, query: Query) -> Select {
    let with_deleted = query.with_deleted;
    let mut select = Select::from_query(meta.table(), Projection::Columns(Vec::new()), query);
    if !with_deleted {
        if let Some(live) = live_condition(meta, Some(meta.table())) {
            select = select.filter(live);
        }
    }
    select
}

/// Adds the locale filter for the context's mode to a SELECT.
///
/// Conditions are ANDed onto the caller's own. In fallback mode an extra
/// `(language_code = <locale>) DESC` term is appended after the caller's
/// order terms, so exact-locale rows win ties with global rows.
pub fn scope_select(
    meta: Option<&ModelMeta>,
    select: Select,
    ctx: &OperationContext,
    resolver: &LocaleResolver,
) -> Select {
    let Some(meta) = localizable(meta) else {
        return select;
    };
    let mode = ctx.effective_mode();
    let locale = resolver.query_locale(ctx);
    let global = resolver.global();
    let outer = select.reference_name().to_string();
    let language_code = ColumnRef::qualified(&outer, LANGUAGE_CODE_COLUMN);

    debug!(
        entity = meta.entity_type(),
        mode = %mode,
        locale = %locale.code,
        "scoping read"
    );

    match mode {
        QueryMode::Unscoped => select,
        QueryMode::Locale => select.filter(Condition::eq(language_code, locale.code.as_str())),
        QueryMode::Global => select.filter(Condition::eq(language_code, global.as_str())),
        QueryMode::Reverse => select
            .filter(Condition::eq(language_code, global.as_str()))
            .filter(Condition::not_exists(live_sibling(meta, &outer, &locale.code))),
        QueryMode::Fallback if locale.is_global => {
            select.filter(Condition::eq(language_code, global.as_str()))
        }
        QueryMode::Fallback => select
            .filter(Condition::Any(vec![
                Condition::eq(language_code.clone(), locale.code.as_str()),
                Condition::All(vec![
                    Condition::eq(language_code.clone(), global.as_str()),
                    Condition::not_exists(live_sibling(meta, &outer, &locale.code)),
                ]),
            ]))
            .order_by(OrderTerm::Matches(
                language_code,
                Value::from(locale.code.as_str()),
                Direction::Desc,
            )),
    }
}

/// Correlated subquery: a live row of the same entity in `locale`.
fn live_sibling(meta: &ModelMeta, outer: &str, locale: &LanguageCode) -> Select {
    let mut sibling = Select::from_table(meta.table(), Projection::One).alias(SIBLING_ALIAS);
    for column in meta.identity_columns() {
        sibling = sibling.filter(Condition::ColumnsEqual(
            ColumnRef::qualified(SIBLING_ALIAS, column),
            ColumnRef::qualified(outer, column),
        ));
    }
    sibling = sibling.filter(locale_condition(locale, Some(SIBLING_ALIAS)));
    if let Some(live) = live_condition(meta, Some(SIBLING_ALIAS)) {
        sibling = sibling.filter(live);
    }
    sibling
}

/// Scopes a publish listing. With a locale it is a `locale`-mode read of
/// that locale; without one, every row whose locale is in `publishable`.
pub fn scope_publish(
    meta: Option<&ModelMeta>,
    select: Select,
    locale: Option<&LanguageCode>,
    publishable: &[LanguageCode],
    resolver: &LocaleResolver,
) -> Select {
    if let Some(locale) = locale {
        let ctx = OperationContext::in_locale(locale.clone()).with_mode(QueryMode::Locale);
        return scope_select(meta, select, &ctx, resolver);
    }
    let Some(meta) = localizable(meta) else {
        return select;
    };
    debug!(
        entity = meta.entity_type(),
        locales = publishable.len(),
        "scoping publish listing"
    );
    let language_code = ColumnRef::qualified(select.reference_name(), LANGUAGE_CODE_COLUMN);
    select.filter(Condition::is_in(
        language_code,
        publishable.iter().map(LanguageCode::as_str),
    ))
}

/// Kind of statement a write turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Insert,
    /// Update the row in the target locale. With `create_missing`, a missing
    /// row is created from the entity's existing row (localized save).
    Update { create_missing: bool },
    /// Copy-write: insert or overwrite the row under the target locale.
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// Locale the write is pinned to. `None` means no locale filter: the
    /// entity is not localizable, or an unscoped write addresses every
    /// locale row of the key.
    pub locale: Option<LanguageCode>,
    pub action: WriteAction,
    pub propagate_sync: bool,
}

impl WritePlan {
    fn passthrough(action: WriteAction) -> Self {
        Self {
            locale: None,
            action,
            propagate_sync: false,
        }
    }
}

/// Decides the locale a new row is stored under.
pub fn plan_insert(
    meta: Option<&ModelMeta>,
    record: &Record,
    ctx: &OperationContext,
    resolver: &LocaleResolver,
) -> L10nResult<WritePlan> {
    let Some(meta) = localizable(meta) else {
        return Ok(WritePlan::passthrough(WriteAction::Insert));
    };
    let mode = ctx.effective_mode();
    let global = resolver.global();

    let locale = match mode {
        QueryMode::Unscoped => match record.language_code() {
            Some(code) => LanguageCode::parse_optional(code)?.unwrap_or_else(|| global.clone()),
            None => global.clone(),
        },
        QueryMode::Locale => resolver.query_locale(ctx).code,
        QueryMode::Global => global.clone(),
        QueryMode::Fallback | QueryMode::Reverse => {
            let target = resolver.write_locale(ctx);
            if !target.is_global && !meta.is_locale_creatable() {
                debug!(
                    entity = meta.entity_type(),
                    requested = %target.code,
                    "entity is only creatable in the global locale"
                );
                global.clone()
            } else {
                target.code
            }
        }
    };

    debug!(entity = meta.entity_type(), mode = %mode, locale = %locale, "planned insert");
    Ok(WritePlan {
        locale: Some(locale),
        action: WriteAction::Insert,
        propagate_sync: mode.propagates_sync(),
    })
}

/// Decides where an update lands.
///
/// `addressed` is the locale of the row the caller loaded, if it has one.
/// In the default modes a localize target that differs from it turns the
/// update into a copy-write.
pub fn plan_update(
    meta: Option<&ModelMeta>,
    addressed: Option<&LanguageCode>,
    ctx: &OperationContext,
    resolver: &LocaleResolver,
) -> WritePlan {
    let Some(meta) = localizable(meta) else {
        return WritePlan::passthrough(WriteAction::Update {
            create_missing: false,
        });
    };
    let mode = ctx.effective_mode();

    let (locale, action) = match mode {
        QueryMode::Unscoped => {
            return WritePlan {
                locale: addressed.cloned(),
                action: WriteAction::Update {
                    create_missing: false,
                },
                propagate_sync: addressed.is_some(),
            };
        }
        QueryMode::Locale => {
            let query = resolver.query_locale(ctx);
            let create_missing = !query.is_global;
            (query.code, WriteAction::Update { create_missing })
        }
        QueryMode::Global => (
            resolver.global().clone(),
            WriteAction::Update {
                create_missing: false,
            },
        ),
        QueryMode::Fallback | QueryMode::Reverse => match &ctx.localize_target {
            Some(target) if addressed != Some(target) => (target.clone(), WriteAction::Upsert),
            _ => {
                let write = resolver.write_locale(ctx);
                let create_missing = !write.is_global;
                (write.code, WriteAction::Update { create_missing })
            }
        },
    };

    debug!(
        entity = meta.entity_type(),
        mode = %mode,
        locale = %locale,
        action = ?action,
        "planned update"
    );
    WritePlan {
        locale: Some(locale),
        action,
        propagate_sync: mode.propagates_sync(),
    }
}

/// Locale rows a delete removes; `None` removes every locale row of the key.
pub fn plan_delete(
    meta: Option<&ModelMeta>,
    ctx: &OperationContext,
    resolver: &LocaleResolver,
) -> Option<LanguageCode> {
    localizable(meta)?;
    match ctx.effective_mode() {
        QueryMode::Unscoped => None,
        QueryMode::Locale => Some(resolver.query_locale(ctx).code),
        QueryMode::Global => Some(resolver.global().clone()),
        QueryMode::Fallback | QueryMode::Reverse => Some(resolver.write_locale(ctx).code),
    }
}
