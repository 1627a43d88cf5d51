//! Error types for the localization layer.

use polyglot_db::DbError;
use polyglot_model::ModelError;
use polyglot_types::LanguageCode;
use thiserror::Error;

/// Result type for localization operations.
pub type L10nResult<T> = Result<T, L10nError>;

#[derive(Debug, Error)]
pub enum L10nError {
    /// The entity type was never registered.
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// No row exists for the key in the requested locale.
    #[error("{entity_type} {key} not found in locale {locale}")]
    NotFound {
        entity_type: String,
        key: String,
        locale: LanguageCode,
    },

    /// A key with the wrong number of values for the entity.
    #[error("{entity_type} key has {expected} column(s), got {got} value(s)")]
    KeyArity {
        entity_type: String,
        expected: usize,
        got: usize,
    },

    /// A request method other than GET, POST, PUT, PATCH or DELETE.
    #[error("unsupported request method: {0}")]
    UnknownMethod(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Types(#[from] polyglot_types::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
