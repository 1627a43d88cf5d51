//! Language code identifiers.
//!
//! A language code names one locale variant of a localized row. It is stored
//! in the `language_code` column and forms part of the row's primary key, so
//! it is validated once at the edge and passed around as a typed value.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Maximum length of a language code, matching the width of the
/// `language_code` key column.
pub const MAX_LANGUAGE_CODE_LEN: usize = 20;

/// Locale that holds the canonical row of every entity unless configured
/// otherwise.
pub const DEFAULT_GLOBAL_LOCALE: &str = "en-US";

/// A validated locale identifier such as `en-US` or `zh`.
///
/// Codes are compared byte-for-byte; no case folding or BCP 47
/// canonicalization is applied, so `zh-CN` and `zh-cn` are distinct locales.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parses and validates a language code.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidLanguageCode {
            code: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if s.len() > MAX_LANGUAGE_CODE_LEN {
            return Err(invalid("longer than 20 characters"));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
        }
        Ok(Self(s.to_string()))
    }

    /// The default global locale, [`DEFAULT_GLOBAL_LOCALE`].
    #[must_use]
    pub fn default_global() -> Self {
        Self(DEFAULT_GLOBAL_LOCALE.to_string())
    }

    /// Parses an optional code where an empty or blank string means "unset".
    ///
    /// Request parameters and cookies commonly carry an empty value instead of
    /// omitting the key; both resolve to `None`.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Self::parse(trimmed).map(Some)
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code and returns the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LanguageCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
