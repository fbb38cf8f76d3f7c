use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::preferences::{
    parse_accept_language, resolve_locale, resolve_theme, ThemePresentation,
};
use crate::models::{Locale, Preferences, Theme, ThemePreference};
use crate::services::availability::lock_db;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub locale: Option<String>,
}

/// What the page shell needs: the effective theme and language plus the
/// stored choices they were derived from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPreferences {
    pub theme: Theme,
    pub locale: Locale,
    pub presentation: ThemePresentation,
    pub stored: Preferences,
}

#[derive(Clone)]
pub struct PreferenceService {
    db: Arc<Mutex<Connection>>,
    default_locale: Locale,
}

impl PreferenceService {
    pub fn new(db: Arc<Mutex<Connection>>, default_locale: Locale) -> Self {
        Self { db, default_locale }
    }

    pub fn get(&self, user_id: &str) -> Result<Preferences, AppError> {
        let conn = lock_db(&self.db)?;
        queries::get_preferences(&conn, user_id).map_err(AppError::Unexpected)
    }

    /// Both values are checked before anything is written.
    pub fn set(&self, user_id: &str, update: PreferencesUpdate) -> Result<Preferences, AppError> {
        let theme = update
            .theme
            .as_deref()
            .map(|t| {
                ThemePreference::parse(t).ok_or_else(|| {
                    AppError::validation("theme", "Theme must be light, dark or system")
                })
            })
            .transpose()?;
        let locale = update
            .locale
            .as_deref()
            .map(|l| {
                Locale::parse(l).ok_or_else(|| {
                    AppError::validation("locale", format!("Unsupported language: {l}"))
                })
            })
            .transpose()?;

        let conn = lock_db(&self.db)?;
        if let Some(theme) = theme {
            queries::set_preference(&conn, user_id, "theme", theme.as_str())?;
        }
        if let Some(locale) = locale {
            queries::set_preference(&conn, user_id, "locale", locale.as_str())?;
        }
        tracing::debug!(user_id, ?theme, ?locale, "preferences updated");
        Ok(queries::get_preferences(&conn, user_id)?)
    }

    /// Anonymous visitors (`user_id == None`) resolve from the system hints
    /// alone. A failing store degrades to the same path.
    pub fn resolve(
        &self,
        user_id: Option<&str>,
        system_theme: Option<&str>,
        accept_language: Option<&str>,
    ) -> ResolvedPreferences {
        let stored = match user_id {
            Some(uid) => self.get(uid).unwrap_or_else(|e| {
                tracing::warn!(error = %e, user_id = uid, "could not load preferences");
                Preferences::default()
            }),
            None => Preferences::default(),
        };

        let system = system_theme.and_then(Theme::parse).unwrap_or(Theme::Light);
        let theme = resolve_theme(stored.theme, system);

        let languages = accept_language.map(parse_accept_language).unwrap_or_default();
        let languages: Vec<&str> = languages.iter().map(String::as_str).collect();
        let locale = resolve_locale(stored.locale.as_deref(), &languages, self.default_locale);

        ResolvedPreferences {
            theme,
            locale,
            presentation: theme.presentation(),
            stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn service() -> PreferenceService {
        let conn = db::init_db(":memory:").unwrap();
        PreferenceService::new(Arc::new(Mutex::new(conn)), Locale::En)
    }

    #[test]
    fn test_set_then_resolve() {
        let svc = service();
        svc.set(
            "u1",
            PreferencesUpdate {
                theme: Some("dark".to_string()),
                locale: Some("fr-CA".to_string()),
            },
        )
        .unwrap();

        let resolved = svc.resolve(Some("u1"), Some("light"), Some("de-DE"));
        assert_eq!(resolved.theme, Theme::Dark);
        assert_eq!(resolved.locale, Locale::Fr);
        assert_eq!(resolved.presentation.root_class, "dark");
        assert_eq!(resolved.stored.locale.as_deref(), Some("fr"));
    }

    #[test]
    fn test_anonymous_follows_system() {
        let resolved = service().resolve(None, Some("dark"), Some("ja, es;q=0.8"));
        assert_eq!(resolved.theme, Theme::Dark);
        assert_eq!(resolved.locale, Locale::Es);
    }

    #[test]
    fn test_no_hints_uses_defaults() {
        let resolved = service().resolve(Some("nobody"), None, None);
        assert_eq!(resolved.theme, Theme::Light);
        assert_eq!(resolved.locale, Locale::En);
    }

    #[test]
    fn test_invalid_values_write_nothing() {
        let svc = service();
        let err = svc
            .set(
                "u1",
                PreferencesUpdate {
                    theme: Some("dark".to_string()),
                    locale: Some("klingon".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "locale", .. }));
        assert_eq!(svc.get("u1").unwrap(), Preferences::default());

        let err = svc
            .set(
                "u1",
                PreferencesUpdate {
                    theme: Some("sepia".to_string()),
                    locale: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: "theme", .. }));
    }

    #[test]
    fn test_system_choice_defers_to_os() {
        let svc = service();
        svc.set(
            "u2",
            PreferencesUpdate {
                theme: Some("system".to_string()),
                locale: None,
            },
        )
        .unwrap();
        assert_eq!(svc.resolve(Some("u2"), Some("dark"), None).theme, Theme::Dark);
        assert_eq!(svc.resolve(Some("u2"), Some("light"), None).theme, Theme::Light);
    }
}
