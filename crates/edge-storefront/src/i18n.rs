//! Locale detection from the request path.

/// Language/country pair used for `@inContext` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nLocale {
    /// ISO 639-1 language, upper case (e.g. `EN`).
    pub language: String,
    /// ISO 3166-1 country, upper case (e.g. `US`).
    pub country: String,
    /// Path prefix that selected this locale (e.g. `/fr-ca`), empty for the default.
    pub path_prefix: String,
}

impl Default for I18nLocale {
    fn default() -> Self {
        Self {
            language: "EN".to_string(),
            country: "US".to_string(),
            path_prefix: String::new(),
        }
    }
}

impl I18nLocale {
    /// Derive the locale from the first path segment, e.g. `/fr-ca/products`.
    ///
    /// Anything that is not a `xx-yy` segment of ASCII letters falls back to
    /// the default locale.
    pub fn from_path(path: &str) -> Self {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or("");

        match first.split_once('-') {
            Some((language, country))
                if is_code(language) && is_code(country) =>
            {
                Self {
                    language: language.to_ascii_uppercase(),
                    country: country.to_ascii_uppercase(),
                    path_prefix: format!("/{}", first.to_ascii_lowercase()),
                }
            }
            _ => Self::default(),
        }
    }
}

fn is_code(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic())
}
