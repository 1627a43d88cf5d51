//! The localization facade.
//!
//! [`L10n`] owns the configuration and the model registry and runs every
//! read and write through the rewrite engine. Writes and their sync
//! propagation share one savepoint on the caller's connection, so they
//! commit or roll back together inside whatever transaction is open.

use crate::access::{LocaleAccess, LocaleAccessPolicy};
use crate::config::L10nConfig;
use crate::context::{LocaleResolver, OperationContext};
use crate::localize::{self, LocalizeRequest};
use crate::rewrite::{self, WriteAction, WritePlan};
use crate::rows::{
    Row, declared_values, delete_rows, exact_row, format_key, insert_row, key_conditions,
    live_condition, locale_condition, purge_deleted, seed_row, upsert_row,
};
use crate::sync;
use crate::{L10nError, L10nResult};
use polyglot_db::{
    Connection, Direction, OrderTerm, Projection, Query, Select, Update, col, execute, exists,
    fetch, fetch_column, with_savepoint,
};
use polyglot_model::{LANGUAGE_CODE_COLUMN, Model, ModelMeta, ModelRegistry, Record};
use polyglot_types::{LanguageCode, QueryMode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const WRITE_SAVEPOINT: &str = "polyglot_write";

/// What a write did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Locale the primary write was pinned to. `None` for entities that are
    /// not localizable and for unscoped writes across every locale.
    pub locale: Option<LanguageCode>,
    pub rows_affected: usize,
    /// A row was created in the target locale.
    pub created: bool,
    /// Sibling rows updated by sync propagation.
    pub synced: usize,
}

pub struct L10n {
    config: L10nConfig,
    registry: ModelRegistry,
    resolver: LocaleResolver,
}

impl L10n {
    pub fn new(config: L10nConfig, registry: ModelRegistry) -> Self {
        let resolver = LocaleResolver::new(config.global_locale.clone());
        Self {
            config,
            registry,
            resolver,
        }
    }

    pub fn config(&self) -> &L10nConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    pub fn global_locale(&self) -> &LanguageCode {
        self.resolver.global()
    }

    pub fn access_policy(&self) -> LocaleAccessPolicy {
        LocaleAccessPolicy::new(self.global_locale().clone())
    }

    /// Metadata of a registered entity type.
    pub fn meta(&self, entity_type: &str) -> L10nResult<Arc<ModelMeta>> {
        self.registry
            .get(entity_type)
            .ok_or_else(|| L10nError::UnknownEntity(entity_type.to_string()))
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Scopes an arbitrary SELECT by its table. Tables of unknown or
    /// non-localizable entities pass through unchanged.
    pub fn scope_select(&self, select: Select, ctx: &OperationContext) -> Select {
        let meta = self.registry.by_table(&select.table);
        rewrite::scope_select(meta.as_deref(), select, ctx, &self.resolver)
    }

    /// Scopes a publish listing for `user`: `locale`'s rows when given,
    /// otherwise the rows of every locale the user may publish.
    pub fn scope_publishable(
        &self,
        select: Select,
        user: &impl LocaleAccess,
        locale: Option<&LanguageCode>,
    ) -> Select {
        let meta = self.registry.by_table(&select.table);
        let publishable = self.access_policy().publishable_locales(user);
        rewrite::scope_publish(meta.as_deref(), select, locale, &publishable, &self.resolver)
    }

    pub fn find_publishable(
        &self,
        conn: &Connection,
        entity_type: &str,
        user: &impl LocaleAccess,
        locale: Option<&LanguageCode>,
        query: Query,
    ) -> L10nResult<Vec<Record>> {
        let meta = self.meta(entity_type)?;
        let publishable = self.access_policy().publishable_locales(user);
        let select = rewrite::scope_publish(
            Some(&*meta),
            rewrite::base_select(&meta, query),
            locale,
            &publishable,
            &self.resolver,
        );
        let rows = fetch(conn, &select, meta.columns())?;
        Ok(records(&meta, rows))
    }

    pub fn find(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        entity_type: &str,
        query: Query,
    ) -> L10nResult<Vec<Record>> {
        let meta = self.meta(entity_type)?;
        let select = rewrite::scope_select(
            Some(&*meta),
            rewrite::base_select(&meta, query),
            ctx,
            &self.resolver,
        );
        let rows = fetch(conn, &select, meta.columns())?;
        Ok(records(&meta, rows))
    }

    /// The row visible for `key` under the context.
    pub fn find_by_key(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        entity_type: &str,
        key: &[Value],
    ) -> L10nResult<Option<Record>> {
        let meta = self.meta(entity_type)?;
        let query = key_conditions(&meta, key, Some(meta.table()))?
            .into_iter()
            .fold(Query::new(), Query::filter)
            .limit(1);
        Ok(self.find(conn, ctx, entity_type, query)?.into_iter().next())
    }

    /// Locales the entity has live rows in, sorted. Ignores the mode.
    pub fn distinct_locales(
        &self,
        conn: &Connection,
        entity_type: &str,
        key: &[Value],
    ) -> L10nResult<Vec<LanguageCode>> {
        let meta = self.meta(entity_type)?;
        if !meta.is_localizable() {
            return Ok(Vec::new());
        }
        let mut select = Select::from_table(
            meta.table(),
            Projection::Distinct(vec![LANGUAGE_CODE_COLUMN.to_string()]),
        )
        .order_by(OrderTerm::Column(col(LANGUAGE_CODE_COLUMN), Direction::Asc));
        for condition in key_conditions(&meta, key, None)? {
            select = select.filter(condition);
        }
        if let Some(live) = live_condition(&meta, None) {
            select = select.filter(live);
        }

        fetch_column(conn, &select)?
            .iter()
            .map(|value| match value {
                Value::String(code) => Ok(LanguageCode::parse(code)?),
                other => Err(L10nError::Config(format!(
                    "{} has a non-text language code: {other}",
                    meta.table()
                ))),
            })
            .collect()
    }

    // ── Writes ──────────────────────────────────────────────────

    pub fn insert(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        record: &Record,
    ) -> L10nResult<WriteOutcome> {
        let meta = self.meta(&record.entity_type)?;
        let plan = rewrite::plan_insert(Some(&*meta), record, ctx, &self.resolver)?;
        let key = record.key_values(meta.schema())?;
        let mut row = declared_values(&meta, &record.values);
        if let Some(locale) = &plan.locale {
            row.insert(LANGUAGE_CODE_COLUMN.into(), Value::from(locale.as_str()));
        }

        with_savepoint(conn, WRITE_SAVEPOINT, |conn| {
            let rows_affected = insert_row(conn, &meta, &row)?;
            let synced = self.propagate(conn, &meta, &plan, &key, &row)?;
            Ok(WriteOutcome {
                locale: plan.locale.clone(),
                rows_affected,
                created: true,
                synced,
            })
        })
    }

    /// Saves a loaded record.
    ///
    /// The record's own `language_code` is the locale it was loaded from; a
    /// localize target that differs from it makes this a copy-write.
    pub fn update(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        record: &Record,
    ) -> L10nResult<WriteOutcome> {
        let meta = self.meta(&record.entity_type)?;
        let key = record.key_values(meta.schema())?;
        let addressed = match record.language_code() {
            Some(code) => LanguageCode::parse_optional(code)?,
            None => None,
        };
        let plan = rewrite::plan_update(Some(&*meta), addressed.as_ref(), ctx, &self.resolver);
        let changes = declared_values(&meta, &record.values);
        self.write_update(conn, &meta, &key, &plan, addressed.as_ref(), changes)
    }

    /// Updates only the given columns. Only sync columns among them are
    /// propagated.
    pub fn update_columns(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        entity_type: &str,
        key: &[Value],
        changes: &Row,
    ) -> L10nResult<WriteOutcome> {
        let meta = self.meta(entity_type)?;
        let addressed = match ctx.effective_mode() {
            QueryMode::Unscoped => None,
            QueryMode::Global => Some(self.global_locale().clone()),
            _ => Some(self.resolver.query_locale(ctx).code),
        };
        let plan = rewrite::plan_update(Some(&*meta), addressed.as_ref(), ctx, &self.resolver);
        let changes = declared_values(&meta, changes);
        self.write_update(conn, &meta, key, &plan, addressed.as_ref(), changes)
    }

    fn write_update(
        &self,
        conn: &Connection,
        meta: &ModelMeta,
        key: &[Value],
        plan: &WritePlan,
        addressed: Option<&LanguageCode>,
        changes: Row,
    ) -> L10nResult<WriteOutcome> {
        with_savepoint(conn, WRITE_SAVEPOINT, |conn| {
            let mut outcome = WriteOutcome {
                locale: plan.locale.clone(),
                ..WriteOutcome::default()
            };

            match (plan.action, &plan.locale) {
                (WriteAction::Upsert, Some(target)) => {
                    let preferred: Vec<&LanguageCode> =
                        addressed.into_iter().chain([self.global_locale()]).collect();
                    let row = self.localized_row(conn, meta, key, &preferred, target, &changes)?;
                    outcome.rows_affected = upsert_row(conn, meta, &row)?;
                    outcome.created = true;
                }
                (_, locale) => {
                    // A row loaded in one locale never overwrites another
                    // locale's row in place.
                    let foreign = matches!(
                        (addressed, locale),
                        (Some(from), Some(to)) if from != to
                    );
                    if foreign {
                        debug!(
                            entity = meta.entity_type(),
                            key = %format_key(key),
                            "addressed row is in another locale, skipping in-place update"
                        );
                    } else {
                        outcome.rows_affected =
                            self.update_in_place(conn, meta, key, locale.as_ref(), &changes)?;
                    }
                    let create_missing =
                        matches!(plan.action, WriteAction::Update { create_missing: true });
                    if let (0, true, Some(locale)) = (outcome.rows_affected, create_missing, locale)
                    {
                        outcome.rows_affected =
                            self.create_localized(conn, meta, key, addressed, locale, &changes)?;
                        outcome.created = outcome.rows_affected > 0;
                    }
                }
            }

            if outcome.rows_affected > 0 {
                outcome.synced = self.propagate(conn, meta, plan, key, &changes)?;
            }
            Ok(outcome)
        })
    }

    /// UPDATE of the non-key columns in `changes` for live rows of `key`,
    /// limited to `locale` when given.
    fn update_in_place(
        &self,
        conn: &Connection,
        meta: &ModelMeta,
        key: &[Value],
        locale: Option<&LanguageCode>,
        changes: &Row,
    ) -> L10nResult<usize> {
        let mut conditions = key_conditions(meta, key, None)?;
        if let Some(locale) = locale {
            conditions.push(locale_condition(locale, None));
        }
        if let Some(live) = live_condition(meta, None) {
            conditions.push(live);
        }

        let assignments: Vec<(&String, &Value)> = changes
            .iter()
            .filter(|(column, _)| {
                column.as_str() != LANGUAGE_CODE_COLUMN
                    && !meta.identity_columns().contains(column)
            })
            .collect();
        if assignments.is_empty() {
            // Nothing to set; report whether the row is there.
            let select = conditions.into_iter().fold(
                Select::from_table(meta.table(), Projection::One),
                Select::filter,
            );
            return Ok(usize::from(exists(conn, &select)?));
        }

        let mut update = Update::new(meta.table());
        for (column, value) in assignments {
            update = update.set(column, value.clone());
        }
        let update = conditions.into_iter().fold(update, Update::filter);
        Ok(execute(conn, &update.to_sql()?)?)
    }

    /// Localized save: the entity exists but has no live row in `locale`.
    /// Seeds one from the addressed row, else its global row (or any live
    /// row), purging soft-deleted leftovers first. Returns 0 when the entity
    /// does not exist at all.
    fn create_localized(
        &self,
        conn: &Connection,
        meta: &ModelMeta,
        key: &[Value],
        addressed: Option<&LanguageCode>,
        locale: &LanguageCode,
        changes: &Row,
    ) -> L10nResult<usize> {
        if exact_row(conn, meta, key, locale)?.is_some() {
            return Ok(0);
        }
        let preferred: Vec<&LanguageCode> =
            addressed.into_iter().chain([self.global_locale()]).collect();
        let row = match self.localized_row(conn, meta, key, &preferred, locale, changes) {
            Ok(row) => row,
            Err(L10nError::NotFound { .. }) => {
                debug!(
                    entity = meta.entity_type(),
                    key = %format_key(key),
                    "nothing to localize, entity does not exist"
                );
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        purge_deleted(conn, meta, key, locale)?;
        debug!(
            entity = meta.entity_type(),
            key = %format_key(key),
            locale = %locale,
            "creating localized row"
        );
        insert_row(conn, meta, &row)
    }

    /// An existing row of the entity with `changes` applied, re-keyed to
    /// `target`.
    fn localized_row(
        &self,
        conn: &Connection,
        meta: &ModelMeta,
        key: &[Value],
        preferred: &[&LanguageCode],
        target: &LanguageCode,
        changes: &Row,
    ) -> L10nResult<Row> {
        let mut row = seed_row(conn, meta, key, preferred)?.ok_or_else(|| L10nError::NotFound {
            entity_type: meta.entity_type().to_string(),
            key: format_key(key),
            locale: target.clone(),
        })?;
        for (column, value) in changes {
            row.insert(column.clone(), value.clone());
        }
        row.insert(LANGUAGE_CODE_COLUMN.into(), Value::from(target.as_str()));
        if let Some(column) = meta.soft_delete_column() {
            row.insert(column.to_string(), Value::Null);
        }
        Ok(row)
    }

    fn propagate(
        &self,
        conn: &Connection,
        meta: &ModelMeta,
        plan: &WritePlan,
        key: &[Value],
        values: &Row,
    ) -> L10nResult<usize> {
        match (&plan.locale, plan.propagate_sync) {
            (Some(locale), true) => sync::propagate(conn, meta, key, locale, values),
            _ => Ok(0),
        }
    }

    /// Deletes the rows of `key` the context addresses: one locale in the
    /// default modes, every locale in unscoped mode. Soft-delete entities
    /// get their delete column stamped instead. Sync values never propagate.
    pub fn delete(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        entity_type: &str,
        key: &[Value],
    ) -> L10nResult<WriteOutcome> {
        let meta = self.meta(entity_type)?;
        let locale = rewrite::plan_delete(Some(&*meta), ctx, &self.resolver);
        let mut conditions = key_conditions(&meta, key, None)?;
        if let Some(locale) = &locale {
            conditions.push(locale_condition(locale, None));
        }
        let rows_affected = delete_rows(conn, &meta, conditions)?;
        debug!(
            entity = meta.entity_type(),
            key = %format_key(key),
            locale = ?locale.as_ref().map(LanguageCode::as_str),
            rows_affected,
            "deleted"
        );
        Ok(WriteOutcome {
            locale,
            rows_affected,
            ..WriteOutcome::default()
        })
    }

    /// Copies entities from one locale to others. See [`LocalizeRequest`].
    pub fn localize(
        &self,
        conn: &Connection,
        entity_type: &str,
        keys: &[Vec<Value>],
        request: &LocalizeRequest,
    ) -> L10nResult<usize> {
        let meta = self.meta(entity_type)?;
        localize::localize(conn, &meta, keys, request)
    }

    // ── Typed models ────────────────────────────────────────────

    pub fn find_models<T: Model>(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        query: Query,
    ) -> L10nResult<Vec<T>> {
        self.find(conn, ctx, T::ENTITY_TYPE, query)?
            .into_iter()
            .map(|record| record.into_model().map_err(L10nError::from))
            .collect()
    }

    pub fn find_model<T: Model>(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        key: &[Value],
    ) -> L10nResult<Option<T>> {
        self.find_by_key(conn, ctx, T::ENTITY_TYPE, key)?
            .map(|record| record.into_model().map_err(L10nError::from))
            .transpose()
    }

    pub fn insert_model<T: Model>(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        model: &T,
    ) -> L10nResult<WriteOutcome> {
        self.insert(conn, ctx, &Record::from_model(model)?)
    }

    pub fn update_model<T: Model>(
        &self,
        conn: &Connection,
        ctx: &OperationContext,
        model: &T,
    ) -> L10nResult<WriteOutcome> {
        self.update(conn, ctx, &Record::from_model(model)?)
    }
}

fn records(meta: &ModelMeta, rows: Vec<Row>) -> Vec<Record> {
    rows.into_iter()
        .map(|values| Record {
            entity_type: meta.entity_type().to_string(),
            values,
        })
        .collect()
}
