//! Shared pieces of the `polyglot` command-line tool.
//!
//! The tool reads one TOML file:
//!
//! ```toml
//! [database]
//! path = "data/catalog.db"
//! busy_timeout_ms = 5000
//!
//! [l10n]
//! global_locale = "en-US"
//! available_locales = ["en-US", "zh"]
//!
//! [[entities]]
//! entity_type = "product"
//! table = "products"
//! primary_key = ["id"]
//! localizable = true
//! soft_delete = "deleted_at"
//! fields = [
//!     { name = "id", type = "integer" },
//!     { name = "quantity", type = "integer", sync = true },
//!     { name = "name", type = "text" },
//! ]
//! ```

use anyhow::{Context, Result, bail};
use polyglot_db::{Database, DbConfig, Query};
use polyglot_l10n::{L10n, L10nConfig, LocalizeRequest, Method, OperationContext, RequestParams};
use polyglot_model::{EntitySchema, FieldType, ModelMeta, ModelRegistry, Record};
use polyglot_types::LanguageCode;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_DB_PATH: &str = "polyglot.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(flatten)]
    pub settings: DbConfig,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            settings: DbConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    entities: Vec<EntitySchema>,
}

/// Everything the tool reads from its config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliConfig {
    pub database: DatabaseSection,
    pub l10n: L10nConfig,
    pub entities: Vec<EntitySchema>,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(
            "Loaded config from {:?} ({} entities)",
            path,
            config.entities.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let l10n = L10nConfig::from_toml_str(contents)?;
        Ok(Self {
            database: file.database,
            l10n,
            entities: file.entities,
        })
    }

    pub fn registry(&self) -> Result<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        for schema in &self.entities {
            registry
                .register(schema.clone())
                .with_context(|| format!("Invalid schema for entity {}", schema.entity_type))?;
        }
        Ok(registry)
    }
}

/// An open database plus the localization layer configured for it.
pub struct Workspace {
    pub db: Database,
    pub l10n: L10n,
}

impl Workspace {
    /// Opens the configured database, or `db_path` when given, and creates
    /// missing entity tables.
    pub fn open(config: CliConfig, db_path: Option<&Path>) -> Result<Self> {
        let path = db_path.unwrap_or(config.database.path.as_path());
        let db = Database::open(path, &config.database.settings)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::with_database(config, db)
    }

    pub fn open_in_memory(config: CliConfig) -> Result<Self> {
        Self::with_database(config, Database::open_in_memory()?)
    }

    fn with_database(config: CliConfig, db: Database) -> Result<Self> {
        let registry = config.registry()?;
        db.ensure_tables(&config.entities)
            .context("Failed to create entity tables")?;
        Ok(Self {
            db,
            l10n: L10n::new(config.l10n, registry),
        })
    }

    /// Configured locales, global first.
    pub fn locale_lines(&self) -> Vec<String> {
        let global = self.l10n.global_locale();
        self.l10n
            .config()
            .locales()
            .into_iter()
            .map(|locale| {
                if &locale == global {
                    format!("{locale} (global)")
                } else {
                    locale.to_string()
                }
            })
            .collect()
    }

    /// Copies `keys` of `entity_type` from `from` (global when `None`) to
    /// every locale in `to`, committing once at the end.
    pub fn localize(
        &mut self,
        entity_type: &str,
        keys: &[String],
        from: Option<&str>,
        to: &[String],
    ) -> Result<usize> {
        let meta = self.l10n.meta(entity_type)?;
        let keys = keys
            .iter()
            .map(|raw| parse_key(&meta, raw))
            .collect::<Result<Vec<_>>>()?;
        let from = match from {
            Some(code) => LanguageCode::parse(code)?,
            None => self.l10n.global_locale().clone(),
        };
        let to = to
            .iter()
            .map(|code| LanguageCode::parse(code))
            .collect::<Result<Vec<_>, _>>()?;
        let request = LocalizeRequest::new(from, to);

        let tx = self.db.transaction()?;
        let written = self
            .l10n
            .localize(&tx, entity_type, &keys, &request)
            .with_context(|| format!("Failed to localize {entity_type}"))?;
        tx.commit()?;
        Ok(written)
    }

    /// Rows of `entity_type` as seen from `locale` in `mode`, optionally
    /// limited to one key.
    pub fn show(
        &self,
        entity_type: &str,
        key: Option<&str>,
        locale: Option<&str>,
        mode: Option<&str>,
    ) -> Result<Vec<Record>> {
        let ctx = self.context(locale, mode)?;
        let conn = self.db.connection();
        match key {
            Some(raw) => {
                let meta = self.l10n.meta(entity_type)?;
                let key = parse_key(&meta, raw)?;
                Ok(self
                    .l10n
                    .find_by_key(conn, &ctx, entity_type, &key)?
                    .into_iter()
                    .collect())
            }
            None => Ok(self.l10n.find(conn, &ctx, entity_type, Query::new())?),
        }
    }

    fn context(&self, locale: Option<&str>, mode: Option<&str>) -> Result<OperationContext> {
        let mut params = RequestParams::new(Method::Get);
        if let Some(locale) = locale {
            params = params.with_current_locale(locale);
        }
        if let Some(mode) = mode {
            params = params.with_param("locale_mode", mode);
        }
        Ok(params.to_context(self.l10n.resolver())?)
    }
}

/// Parses a comma-separated key in the order of the entity's key columns.
pub fn parse_key(meta: &ModelMeta, raw: &str) -> Result<Vec<Value>> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let columns = meta.identity_columns();
    if parts.len() != columns.len() {
        bail!(
            "{} has {} key column(s) ({}), got {:?}",
            meta.entity_type(),
            columns.len(),
            columns.join(", "),
            raw
        );
    }

    columns
        .iter()
        .zip(parts)
        .map(|(column, part)| -> Result<Value> {
            let field_type = meta
                .columns()
                .iter()
                .find(|c| &c.name == column)
                .map_or(FieldType::Text, |c| c.field_type);
            let value = match field_type {
                FieldType::Integer | FieldType::Bool => Value::from(
                    part.parse::<i64>()
                        .with_context(|| format!("{column} must be an integer, got {part:?}"))?,
                ),
                FieldType::Real => Value::from(
                    part.parse::<f64>()
                        .with_context(|| format!("{column} must be a number, got {part:?}"))?,
                ),
                FieldType::Text | FieldType::Json => Value::from(part),
            };
            Ok(value)
        })
        .collect()
}
