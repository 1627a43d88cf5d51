use polyglot_types::{Error, QueryMode};
use std::str::FromStr;

#[test]
fn default_mode_is_fallback() {
    assert_eq!(QueryMode::default(), QueryMode::Fallback);
}

#[test]
fn parse_known_modes() {
    assert_eq!(QueryMode::from_str("unscoped").unwrap(), QueryMode::Unscoped);
    assert_eq!(QueryMode::from_str("locale").unwrap(), QueryMode::Locale);
    assert_eq!(QueryMode::from_str("global").unwrap(), QueryMode::Global);
    assert_eq!(QueryMode::from_str("reverse").unwrap(), QueryMode::Reverse);
    assert_eq!(QueryMode::from_str("fallback").unwrap(), QueryMode::Fallback);
}

#[test]
fn parse_ignores_case_and_padding() {
    assert_eq!(QueryMode::from_str(" Unscoped ").unwrap(), QueryMode::Unscoped);
    assert_eq!(QueryMode::from_str("LOCALE").unwrap(), QueryMode::Locale);
}

#[test]
fn parse_unknown_mode_errors() {
    let err = QueryMode::from_str("everything").unwrap_err();
    assert_eq!(err, Error::UnknownMode("everything".to_string()));
}

#[test]
fn display_matches_parse() {
    for mode in QueryMode::ALL {
        assert_eq!(QueryMode::from_str(&mode.to_string()).unwrap(), mode);
    }
}

#[test]
fn single_locale_modes_skip_sync() {
    assert!(QueryMode::Fallback.propagates_sync());
    assert!(QueryMode::Reverse.propagates_sync());
    assert!(!QueryMode::Locale.propagates_sync());
    assert!(!QueryMode::Global.propagates_sync());
    assert!(QueryMode::Unscoped.propagates_sync());
}

#[test]
fn serde_uses_lowercase_names() {
    let json = serde_json::to_string(&QueryMode::Unscoped).unwrap();
    assert_eq!(json, r#""unscoped""#);
    let mode: QueryMode = serde_json::from_str(r#""reverse""#).unwrap();
    assert_eq!(mode, QueryMode::Reverse);
}
