//! Query scoping modes.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a statement against a localizable entity is scoped to locales.
///
/// The absence of a mode (`Option<QueryMode>::None` on an operation context)
/// behaves exactly like [`QueryMode::Fallback`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// No locale filtering at all; every locale's rows are visible and writes
    /// address rows by their full key. A write to one row still propagates
    /// sync columns.
    Unscoped,
    /// Exactly the query locale. No fallback, no sync propagation.
    Locale,
    /// Exactly the global locale.
    Global,
    /// Global rows that have no live row in the query locale yet.
    Reverse,
    /// The query locale, falling back to the global row where the query
    /// locale has none. Writes propagate sync columns.
    #[default]
    Fallback,
}

impl QueryMode {
    /// All modes, in declaration order.
    pub const ALL: [QueryMode; 5] = [
        QueryMode::Unscoped,
        QueryMode::Locale,
        QueryMode::Global,
        QueryMode::Reverse,
        QueryMode::Fallback,
    ];

    /// The lowercase name used in request parameters and config files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Unscoped => "unscoped",
            QueryMode::Locale => "locale",
            QueryMode::Global => "global",
            QueryMode::Reverse => "reverse",
            QueryMode::Fallback => "fallback",
        }
    }

    /// Whether writes in this mode propagate sync columns to sibling rows.
    ///
    /// `locale` and `global` writes deliberately target one locale and never
    /// propagate. An unscoped write propagates when it addresses a single
    /// locale row.
    #[must_use]
    pub const fn propagates_sync(&self) -> bool {
        !matches!(self, QueryMode::Locale | QueryMode::Global)
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}
