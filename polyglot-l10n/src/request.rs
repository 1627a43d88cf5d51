//! Mapping of admin request data onto an [`OperationContext`].

use crate::context::{LocaleResolver, OperationContext};
use crate::{L10nError, L10nResult};
use polyglot_types::{LanguageCode, QueryMode};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl FromStr for Method {
    type Err = L10nError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(L10nError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// The request data that decides a statement's locale settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub method: Method,
    /// The user's current locale (cookie, header or session).
    pub current_locale: Option<String>,
    /// URL query parameters in request order.
    pub query: Vec<(String, String)>,
    /// Language code part of the resource's primary value, for resources
    /// whose key includes `language_code`.
    pub key_locale: Option<String>,
}

impl RequestParams {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            current_locale: None,
            query: Vec::new(),
            key_locale: None,
        }
    }

    #[must_use]
    pub fn with_current_locale(mut self, locale: &str) -> Self {
        self.current_locale = Some(locale.to_string());
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_key_locale(mut self, locale: &str) -> Self {
        self.key_locale = Some(locale.to_string());
        self
    }

    /// First value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Builds the operation context.
    ///
    /// - the query locale starts as the current locale (or global)
    /// - `locale_mode` sets the mode
    /// - a key locale becomes the query locale; on `PUT` the write is
    ///   redirected to the current locale
    /// - otherwise a `primary_key[<x>_language_code]` parameter becomes the
    ///   query locale; on `PUT` and `POST` the write is redirected to the
    ///   current locale
    /// - a non-empty `sorting` parameter forces `locale` mode
    pub fn to_context(&self, resolver: &LocaleResolver) -> L10nResult<OperationContext> {
        let current = parse_locale(self.current_locale.as_deref())?
            .unwrap_or_else(|| resolver.global().clone());
        let mut ctx = OperationContext::in_locale(current.clone());

        if let Some(mode) = self.param("locale_mode").filter(|m| !m.trim().is_empty()) {
            ctx.mode = Some(mode.parse::<QueryMode>()?);
        }

        if let Some(key_locale) = parse_locale(self.key_locale.as_deref())? {
            ctx.query_locale = Some(key_locale);
            if self.method == Method::Put && ctx.localize_target.is_none() {
                ctx.localize_target = Some(current.clone());
            }
        } else {
            for (name, value) in &self.query {
                if !is_key_locale_param(name) {
                    continue;
                }
                ctx.query_locale = LanguageCode::parse_optional(value)?;
                if matches!(self.method, Method::Put | Method::Post) && ctx.localize_target.is_none() {
                    ctx.localize_target = Some(current.clone());
                }
            }
        }

        if self.param("sorting").is_some_and(|s| !s.is_empty()) {
            ctx.mode = Some(QueryMode::Locale);
        }
        Ok(ctx)
    }
}

fn parse_locale(raw: Option<&str>) -> L10nResult<Option<LanguageCode>> {
    match raw {
        Some(s) => Ok(LanguageCode::parse_optional(s)?),
        None => Ok(None),
    }
}

/// Matches `primary_key[<something>_language_code]`.
fn is_key_locale_param(name: &str) -> bool {
    name.strip_prefix("primary_key[")
        .and_then(|rest| rest.strip_suffix("_language_code]"))
        .is_some_and(|field| !field.is_empty())
}
