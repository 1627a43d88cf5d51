//! Which locales a user may see, edit, create in or publish.
//!
//! A user type implements [`LocaleAccess`] and overrides only the lists it
//! knows about. Missing lists fall back along a chain that ends at the
//! global locale:
//!
//! - viewable → available → `[global]`
//! - editable → available → `[global]`
//! - publishable → editable → available → `[global]`

use polyglot_model::ModelMeta;
use polyglot_types::LanguageCode;

/// Locale lists a user carries. `None` means "not specified".
pub trait LocaleAccess {
    fn available_locales(&self) -> Option<Vec<LanguageCode>> {
        None
    }

    fn viewable_locales(&self) -> Option<Vec<LanguageCode>> {
        None
    }

    fn editable_locales(&self) -> Option<Vec<LanguageCode>> {
        None
    }

    fn publishable_locales(&self) -> Option<Vec<LanguageCode>> {
        None
    }
}

/// A user with no locale lists at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl LocaleAccess for Anonymous {}

/// Resolves [`LocaleAccess`] lists and role predicates against a global
/// locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleAccessPolicy {
    global: LanguageCode,
}

impl LocaleAccessPolicy {
    pub fn new(global: LanguageCode) -> Self {
        Self { global }
    }

    pub fn viewable_locales(&self, user: &impl LocaleAccess) -> Vec<LanguageCode> {
        user.viewable_locales()
            .or_else(|| user.available_locales())
            .unwrap_or_else(|| vec![self.global.clone()])
    }

    pub fn editable_locales(&self, user: &impl LocaleAccess) -> Vec<LanguageCode> {
        user.editable_locales()
            .or_else(|| user.available_locales())
            .unwrap_or_else(|| vec![self.global.clone()])
    }

    pub fn publishable_locales(&self, user: &impl LocaleAccess) -> Vec<LanguageCode> {
        user.publishable_locales()
            .or_else(|| user.editable_locales())
            .or_else(|| user.available_locales())
            .unwrap_or_else(|| vec![self.global.clone()])
    }

    /// Locales a new row of `meta` may be created in: every editable locale
    /// for locale-creatable entities, otherwise the global locale if the
    /// user may edit it.
    pub fn creatable_locales(&self, user: &impl LocaleAccess, meta: &ModelMeta) -> Vec<LanguageCode> {
        let editable = self.editable_locales(user);
        if meta.is_locale_creatable() {
            return editable;
        }
        if editable.contains(&self.global) {
            vec![self.global.clone()]
        } else {
            Vec::new()
        }
    }

    /// Working in the global locale with the right to edit it.
    pub fn is_global_admin(&self, user: &impl LocaleAccess, current: &LanguageCode) -> bool {
        *current == self.global && self.editable_locales(user).contains(&self.global)
    }

    /// May edit rows of the current locale.
    pub fn is_locale_admin(&self, user: &impl LocaleAccess, current: &LanguageCode) -> bool {
        self.editable_locales(user).contains(current)
    }

    /// May read rows of the current locale.
    pub fn is_locale_reader(&self, user: &impl LocaleAccess, current: &LanguageCode) -> bool {
        self.viewable_locales(user).contains(current)
    }

    /// Sync fields hold one value for every locale, so only a global admin
    /// may edit them. Other fields follow the locale admin role.
    pub fn can_edit_field(
        &self,
        user: &impl LocaleAccess,
        meta: &ModelMeta,
        field: &str,
        current: &LanguageCode,
    ) -> bool {
        if meta.sync_columns().iter().any(|c| c == field) {
            self.is_global_admin(user, current)
        } else {
            self.is_locale_admin(user, current)
        }
    }

    /// Any field is readable by a locale reader or admin.
    pub fn can_read_field(&self, user: &impl LocaleAccess, current: &LanguageCode) -> bool {
        self.is_locale_reader(user, current) || self.is_locale_admin(user, current)
    }
}
