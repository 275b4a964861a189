//! Request locale determination.

use serde::Serialize;

use crate::config::LocaleConfig;

/// Which input decided the request locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleSource {
    Route,
    Stored,
    Header,
    Default,
}

/// Per-request inputs to locale determination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleInputs<'a> {
    /// Name of the matched route, if any.
    pub route_name: Option<&'a str>,
    /// Locale remembered from a previous request (cookie).
    pub stored: Option<&'a str>,
    /// Raw `Accept-Language` header.
    pub accept_language: Option<&'a str>,
}

/// Decides the request locale from configured locales.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    locales: Vec<String>,
    default: String,
}

impl LocaleResolver {
    pub fn new(locales: Vec<String>, default: impl Into<String>) -> Self {
        Self {
            locales,
            default: default.into(),
        }
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default
    }

    pub fn is_available(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Matched route, then stored locale, then `Accept-Language`, then the default.
    pub fn determine(&self, inputs: LocaleInputs<'_>) -> (String, LocaleSource) {
        if let Some(name) = inputs.route_name {
            let first = name.split('.').next().unwrap_or_default();
            if self.is_available(first) {
                return (first.to_string(), LocaleSource::Route);
            }
        }

        if let Some(stored) = inputs.stored.filter(|l| self.is_available(l)) {
            return (stored.to_string(), LocaleSource::Stored);
        }

        if let Some(header) = inputs.accept_language {
            if let Some(locale) = parse_accept_language(header, &self.locales) {
                return (locale, LocaleSource::Header);
            }
        }

        (self.default.clone(), LocaleSource::Default)
    }
}

impl From<&LocaleConfig> for LocaleResolver {
    fn from(config: &LocaleConfig) -> Self {
        Self::new(config.available.clone(), config.default.clone())
    }
}

/// First configured locale in an `Accept-Language` header.
///
/// Entries are ordered by q-value (stable for ties); `q=0` entries are refused.
/// A region tag falls back to its language (`de-AT` → `de`).
pub fn parse_accept_language(header: &str, locales: &[String]) -> Option<String> {
    let mut entries: Vec<(&str, f64)> = Vec::new();
    for part in header.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let mut segments = part.split(';');
        let tag = segments.next().unwrap_or_default().trim();
        let mut q = 1.0_f64;
        for s in segments {
            if let Some(value) = s.trim().strip_prefix("q=") {
                if let Ok(v) = value.parse::<f64>() {
                    q = v;
                }
            }
        }
        if q > 0.0 {
            entries.push((tag, q));
        }
    }

    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let find = |tag: &str| locales.iter().find(|l| l.eq_ignore_ascii_case(tag)).cloned();
    for (tag, _) in entries {
        if let Some(locale) = find(tag) {
            return Some(locale);
        }
        if let Some((prefix, _)) = tag.split_once('-') {
            if let Some(locale) = find(prefix) {
                return Some(locale);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LocaleResolver {
        LocaleResolver::new(vec!["de".into(), "en".into()], "de")
    }

    #[test]
    fn test_route_locale_wins() {
        let inputs = LocaleInputs {
            route_name: Some("en.products.index"),
            stored: Some("de"),
            accept_language: Some("de"),
        };
        assert_eq!(resolver().determine(inputs), ("en".into(), LocaleSource::Route));
    }

    #[test]
    fn test_stored_beats_header() {
        let inputs = LocaleInputs {
            route_name: None,
            stored: Some("en"),
            accept_language: Some("de"),
        };
        assert_eq!(resolver().determine(inputs), ("en".into(), LocaleSource::Stored));
    }

    #[test]
    fn test_unknown_stored_falls_through() {
        let inputs = LocaleInputs {
            stored: Some("fr"),
            accept_language: Some("en-GB,de;q=0.5"),
            ..Default::default()
        };
        assert_eq!(resolver().determine(inputs), ("en".into(), LocaleSource::Header));
    }

    #[test]
    fn test_default_when_nothing_applies() {
        let inputs = LocaleInputs {
            route_name: Some("legacy.page"),
            accept_language: Some("fr,it"),
            ..Default::default()
        };
        assert_eq!(resolver().determine(inputs), ("de".into(), LocaleSource::Default));
    }

    #[test]
    fn test_unparseable_accept_language_falls_back_to_default() {
        for header in [";;q=abc,,", ",,,", "q=0.5;;", "*;q=nope"] {
            let inputs = LocaleInputs {
                accept_language: Some(header),
                ..Default::default()
            };
            assert_eq!(
                resolver().determine(inputs),
                ("de".into(), LocaleSource::Default),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_accept_language_q_order() {
        let locales = vec!["de".to_string(), "en".to_string()];
        assert_eq!(parse_accept_language("de;q=0.4, en;q=0.9", &locales).as_deref(), Some("en"));
        assert_eq!(parse_accept_language("fr, EN, de", &locales).as_deref(), Some("en"));
        assert_eq!(parse_accept_language("de-AT", &locales).as_deref(), Some("de"));
        assert_eq!(parse_accept_language("en;q=0, fr", &locales), None);
        assert_eq!(parse_accept_language("", &locales), None);
    }
}
