//! Per-operation locale context and its resolution.

use polyglot_types::{LanguageCode, QueryMode};

/// Locale settings for one statement.
///
/// Built fresh for every operation; nothing here is cached between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationContext {
    /// Scoping mode. `None` behaves like [`QueryMode::Fallback`].
    pub mode: Option<QueryMode>,
    /// Locale whose rows are read. `None` means the global locale.
    pub query_locale: Option<LanguageCode>,
    /// When set, writes are redirected to this locale.
    pub localize_target: Option<LanguageCode>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context reading `locale` in the default fallback mode.
    pub fn in_locale(locale: LanguageCode) -> Self {
        Self::new().with_locale(locale)
    }

    /// Context with no locale filtering.
    pub fn unscoped() -> Self {
        Self::new().with_mode(QueryMode::Unscoped)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: LanguageCode) -> Self {
        self.query_locale = Some(locale);
        self
    }

    #[must_use]
    pub fn localize_to(mut self, locale: LanguageCode) -> Self {
        self.localize_target = Some(locale);
        self
    }

    /// The mode in effect.
    pub fn effective_mode(&self) -> QueryMode {
        self.mode.unwrap_or_default()
    }
}

/// A locale after resolution against the global locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale {
    pub code: LanguageCode,
    pub is_global: bool,
}

/// Resolves the read and write locale of an [`OperationContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResolver {
    global: LanguageCode,
}

impl LocaleResolver {
    pub fn new(global: LanguageCode) -> Self {
        Self { global }
    }

    pub fn global(&self) -> &LanguageCode {
        &self.global
    }

    /// Wraps a code with its global flag.
    pub fn resolve(&self, code: &LanguageCode) -> ResolvedLocale {
        ResolvedLocale {
            is_global: *code == self.global,
            code: code.clone(),
        }
    }

    /// The locale rows are read from: the context's locale, else global.
    pub fn query_locale(&self, ctx: &OperationContext) -> ResolvedLocale {
        self.resolve(ctx.query_locale.as_ref().unwrap_or(&self.global))
    }

    /// The locale rows are written to: the localize target, else the query
    /// locale.
    pub fn write_locale(&self, ctx: &OperationContext) -> ResolvedLocale {
        match &ctx.localize_target {
            Some(target) => self.resolve(target),
            None => self.query_locale(ctx),
        }
    }
}
