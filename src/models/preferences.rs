use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    System,
}

/// Attributes the page shell applies for a resolved theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemePresentation {
    pub root_class: &'static str,
    pub theme_color: &'static str,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn presentation(&self) -> ThemePresentation {
        match self {
            Theme::Light => ThemePresentation {
                root_class: "light",
                theme_color: "#ffffff",
            },
            Theme::Dark => ThemePresentation {
                root_class: "dark",
                theme_color: "#0f172a",
            },
        }
    }
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(ThemePreference::Light),
            "dark" => Some(ThemePreference::Dark),
            "system" => Some(ThemePreference::System),
            _ => None,
        }
    }
}

pub fn resolve_theme(stored: Option<ThemePreference>, system: Theme) -> Theme {
    match stored {
        None | Some(ThemePreference::System) => system,
        Some(ThemePreference::Light) => Theme::Light,
        Some(ThemePreference::Dark) => Theme::Dark,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
    Es,
    De,
    It,
}

impl Locale {
    pub const SUPPORTED: [Locale; 5] = [Locale::En, Locale::Fr, Locale::Es, Locale::De, Locale::It];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Es => "es",
            Locale::De => "de",
            Locale::It => "it",
        }
    }

    /// Matches on the primary language subtag, so `fr-CA` and `FR` both give
    /// `Locale::Fr`.
    pub fn parse(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .to_lowercase();
        Self::SUPPORTED
            .into_iter()
            .find(|l| l.as_str() == primary)
    }
}

/// Stored choice if supported, then the first supported system language,
/// then the default.
pub fn resolve_locale(stored: Option<&str>, system: &[&str], default: Locale) -> Locale {
    stored
        .and_then(Locale::parse)
        .or_else(|| system.iter().find_map(|tag| Locale::parse(tag)))
        .unwrap_or(default)
}

/// Parses an `Accept-Language` header into tags ordered by quality.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let q = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag.to_string(), q))
        })
        .collect();
    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tags.into_iter().map(|(tag, _)| tag).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preferences {
    pub theme: Option<ThemePreference>,
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_follows_system_when_unset() {
        assert_eq!(resolve_theme(None, Theme::Dark), Theme::Dark);
        assert_eq!(
            resolve_theme(Some(ThemePreference::System), Theme::Light),
            Theme::Light
        );
    }

    #[test]
    fn test_explicit_theme_wins() {
        assert_eq!(
            resolve_theme(Some(ThemePreference::Light), Theme::Dark),
            Theme::Light
        );
        assert_eq!(
            resolve_theme(Some(ThemePreference::Dark), Theme::Light),
            Theme::Dark
        );
    }

    #[test]
    fn test_locale_resolution_order() {
        assert_eq!(resolve_locale(Some("de"), &["fr-FR"], Locale::En), Locale::De);
        assert_eq!(resolve_locale(Some("pt"), &["fr-CA"], Locale::En), Locale::Fr);
        assert_eq!(resolve_locale(None, &["ja", "es_MX"], Locale::En), Locale::Es);
        assert_eq!(resolve_locale(None, &["ja"], Locale::It), Locale::It);
    }

    #[test]
    fn test_accept_language_ordering() {
        let tags = parse_accept_language("ja;q=0.4, fr-CH, fr;q=0.9, *;q=0.1");
        assert_eq!(tags, vec!["fr-CH", "fr", "ja"]);
    }

    #[test]
    fn test_presentation() {
        assert_eq!(Theme::Dark.presentation().root_class, "dark");
        assert_eq!(Theme::Light.presentation().theme_color, "#ffffff");
    }
}
