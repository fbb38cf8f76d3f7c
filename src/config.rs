use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::availability::WorkingHours;
use crate::models::Locale;

#[derive(Clone, Debug, PartialEq)]
pub enum EmailProviderKind {
    Brevo,
    EmailJs,
    Webhook,
}

impl EmailProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brevo" | "sendinblue" => Some(EmailProviderKind::Brevo),
            "emailjs" => Some(EmailProviderKind::EmailJs),
            "webhook" | "http" => Some(EmailProviderKind::Webhook),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub coach_id: String,
    pub contact_inbox: String,
    pub contact_template_id: String,
    pub email_provider: EmailProviderKind,
    pub brevo_api_key: String,
    pub emailjs_service_id: String,
    pub emailjs_user_id: String,
    pub email_webhook_url: String,
    pub newsletter_form_url: String,
    pub auth_enabled: bool,
    pub firebase_api_key: String,
    pub working_hours: WorkingHours,
    pub slot_granularity_minutes: u32,
    pub service_timeout: Duration,
    pub default_locale: Locale,
    pub cors_origin: Option<String>,
    pub maps_place_id: String,
    pub maps_api_key: String,
    pub youtube_playlist_id: String,
    pub booking_widget_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Every missing required
    /// key is collected so the startup diagnostic names all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut missing: Vec<&'static str> = vec![];
        let mut required = |key: &'static str| match get(key) {
            Some(v) => v,
            None => {
                missing.push(key);
                String::new()
            }
        };

        let admin_token = required("ADMIN_TOKEN");
        let coach_id = required("COACH_ID");
        let contact_inbox = required("CONTACT_INBOX");

        let provider_raw = get("EMAIL_PROVIDER").unwrap_or_else(|| "brevo".to_string());
        let email_provider = EmailProviderKind::parse(&provider_raw)
            .ok_or_else(|| AppError::Config(format!("unknown EMAIL_PROVIDER: {provider_raw}")))?;

        let mut brevo_api_key = String::new();
        let mut emailjs_service_id = String::new();
        let mut emailjs_user_id = String::new();
        let mut email_webhook_url = String::new();
        match email_provider {
            EmailProviderKind::Brevo => brevo_api_key = required("BREVO_API_KEY"),
            EmailProviderKind::EmailJs => {
                emailjs_service_id = required("EMAILJS_SERVICE_ID");
                emailjs_user_id = required("EMAILJS_USER_ID");
            }
            EmailProviderKind::Webhook => email_webhook_url = required("EMAIL_WEBHOOK_URL"),
        }

        let auth_enabled = get("AUTH_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let firebase_api_key = if auth_enabled {
            required("FIREBASE_API_KEY")
        } else {
            get("FIREBASE_API_KEY").unwrap_or_default()
        };

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let default_locale = match get("DEFAULT_LOCALE") {
            Some(tag) => Locale::parse(&tag)
                .ok_or_else(|| AppError::Config(format!("unsupported DEFAULT_LOCALE: {tag}")))?,
            None => Locale::En,
        };

        let port = parse_or("PORT", get("PORT"), 3000u16)?;
        let slot_granularity_minutes =
            parse_or("SLOT_GRANULARITY_MINUTES", get("SLOT_GRANULARITY_MINUTES"), 30u32)?;
        if slot_granularity_minutes == 0 {
            return Err(AppError::Config(
                "SLOT_GRANULARITY_MINUTES must be positive".to_string(),
            ));
        }
        let timeout_secs = parse_or("SERVICE_TIMEOUT_SECS", get("SERVICE_TIMEOUT_SECS"), 10u64)?;

        let open = get("WORKING_HOURS_OPEN").unwrap_or_else(|| "09:00".to_string());
        let close = get("WORKING_HOURS_CLOSE").unwrap_or_else(|| "18:00".to_string());
        let working_hours = WorkingHours::parse(&open, &close)
            .map_err(|e| AppError::Config(format!("invalid working hours: {e}")))?;

        Ok(Self {
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "coachdesk.db".to_string()),
            admin_token,
            coach_id,
            contact_inbox,
            contact_template_id: get("CONTACT_TEMPLATE_ID")
                .unwrap_or_else(|| "contact".to_string()),
            email_provider,
            brevo_api_key,
            emailjs_service_id,
            emailjs_user_id,
            email_webhook_url,
            newsletter_form_url: get("NEWSLETTER_FORM_URL").unwrap_or_default(),
            auth_enabled,
            firebase_api_key,
            working_hours,
            slot_granularity_minutes,
            service_timeout: Duration::from_secs(timeout_secs),
            default_locale,
            cors_origin: get("CORS_ORIGIN"),
            maps_place_id: get("MAPS_PLACE_ID").unwrap_or_default(),
            maps_api_key: get("MAPS_API_KEY").unwrap_or_default(),
            youtube_playlist_id: get("YOUTUBE_PLAYLIST_ID").unwrap_or_default(),
            booking_widget_url: get("BOOKING_WIDGET_URL").unwrap_or_default(),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("invalid {key}: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_missing_keys_are_all_named() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ADMIN_TOKEN"));
        assert!(msg.contains("COACH_ID"));
        assert!(msg.contains("CONTACT_INBOX"));
        assert!(msg.contains("BREVO_API_KEY"));
    }

    #[test]
    fn test_provider_specific_keys() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("EMAIL_PROVIDER", "emailjs"),
        ]))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("EMAILJS_SERVICE_ID"));
        assert!(msg.contains("EMAILJS_USER_ID"));
        assert!(!msg.contains("BREVO_API_KEY"));
    }

    #[test]
    fn test_auth_requires_firebase_key() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("BREVO_API_KEY", "k"),
            ("AUTH_ENABLED", "true"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("FIREBASE_API_KEY"));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("BREVO_API_KEY", "k"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.slot_granularity_minutes, 30);
        assert_eq!(config.service_timeout, Duration::from_secs(10));
        assert_eq!(config.working_hours, WorkingHours::default());
        assert_eq!(config.email_provider, EmailProviderKind::Brevo);
        assert!(!config.auth_enabled);
        assert_eq!(config.default_locale, Locale::En);
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        let base = [
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("BREVO_API_KEY", "k"),
        ];
        for (key, value) in [
            ("SLOT_GRANULARITY_MINUTES", "half-hour"),
            ("SLOT_GRANULARITY_MINUTES", "0"),
            ("SERVICE_TIMEOUT_SECS", "-5"),
            ("PORT", "http"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push((key, value));
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(err.to_string().contains(key), "{key}={value}: {err}");
        }
    }

    #[test]
    fn test_unsupported_locale_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("BREVO_API_KEY", "k"),
            ("DEFAULT_LOCALE", "xx"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DEFAULT_LOCALE"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ADMIN_TOKEN", "t"),
            ("COACH_ID", "coach"),
            ("CONTACT_INBOX", "coach@example.com"),
            ("EMAIL_PROVIDER", "carrier-pigeon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
