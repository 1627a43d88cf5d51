//! Localization settings.
//!
//! Read from the `[l10n]` table of a TOML file:
//!
//! ```toml
//! [l10n]
//! global_locale = "en-US"
//! available_locales = ["en-US", "zh", "de"]
//! ```

use crate::{L10nError, L10nResult};
use polyglot_types::LanguageCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L10nConfig {
    /// Locale holding the canonical row of every entity.
    #[serde(default = "default_global_locale")]
    pub global_locale: LanguageCode,
    /// Locales offered to users. Empty means only the global locale.
    #[serde(default)]
    pub available_locales: Vec<LanguageCode>,
}

fn default_global_locale() -> LanguageCode {
    LanguageCode::default_global()
}

impl Default for L10nConfig {
    fn default() -> Self {
        Self {
            global_locale: default_global_locale(),
            available_locales: Vec::new(),
        }
    }
}

/// On-disk layout; other tables in the same file are ignored.
#[derive(Debug, Default, Deserialize)]
struct L10nFile {
    #[serde(default)]
    l10n: Option<L10nConfig>,
}

impl L10nConfig {
    pub fn new(global_locale: LanguageCode) -> Self {
        Self {
            global_locale,
            available_locales: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_available_locales(mut self, locales: impl IntoIterator<Item = LanguageCode>) -> Self {
        self.available_locales = locales.into_iter().collect();
        self
    }

    /// Loads the `[l10n]` table from a TOML file.
    ///
    /// A missing file or a file without the table yields the defaults. A file
    /// that exists but cannot be read or parsed is an error: silently falling
    /// back would change which locale is treated as global.
    pub fn load_from(path: impl AsRef<Path>) -> L10nResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No l10n config found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!(
            "Loaded l10n config from {:?} (global locale {})",
            path, config.global_locale
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> L10nResult<Self> {
        let file: L10nFile = toml::from_str(contents)?;
        let config = file.l10n.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> L10nResult<()> {
        if !self.available_locales.is_empty() && !self.available_locales.contains(&self.global_locale) {
            return Err(L10nError::Config(format!(
                "available_locales must include the global locale {}",
                self.global_locale
            )));
        }
        Ok(())
    }

    /// Available locales, global first, without duplicates.
    pub fn locales(&self) -> Vec<LanguageCode> {
        let mut locales = vec![self.global_locale.clone()];
        for locale in &self.available_locales {
            if !locales.contains(locale) {
                locales.push(locale.clone());
            }
        }
        locales
    }
}
