//! Core type definitions for Polyglot.
//!
//! This crate defines the small, storage-agnostic vocabulary shared by the
//! rest of the workspace:
//! - [`LanguageCode`], the validated locale identifier stored in every
//!   localized row
//! - [`QueryMode`], the scoping discipline applied to a statement
//!
//! Schema metadata lives in `polyglot-model`; statement building and
//! execution live in `polyglot-db`.

mod locale;
mod mode;

pub use locale::{DEFAULT_GLOBAL_LOCALE, LanguageCode, MAX_LANGUAGE_CODE_LEN};
pub use mode::QueryMode;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid language code {code:?}: {reason}")]
    InvalidLanguageCode { code: String, reason: &'static str },

    #[error("unknown query mode: {0}")]
    UnknownMode(String),
}
