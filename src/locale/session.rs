//! Locale persistence between requests and change notification.

use axum::http::{header, HeaderMap, HeaderValue};
use serde::Serialize;
use tokio::sync::broadcast;

/// Emitted when a request resolves to a locale other than the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleChanged {
    pub from: Option<String>,
    pub to: String,
}

/// Fan-out of locale change events to any interested task.
#[derive(Debug, Clone)]
pub struct LocaleEvents {
    tx: broadcast::Sender<LocaleChanged>,
}

impl LocaleEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocaleChanged> {
        self.tx.subscribe()
    }

    /// Log and broadcast. Having no subscribers is fine.
    pub fn emit(&self, event: LocaleChanged) {
        tracing::info!(from = ?event.from, to = %event.to, "Locale changed");
        let _ = self.tx.send(event);
    }
}

impl Default for LocaleEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Locale stored in cookie `name`, if it is one of `locales`.
pub fn stored_locale(headers: &HeaderMap, name: &str, locales: &[String]) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
        .filter(|v| locales.iter().any(|l| l == v))
        .map(str::to_string)
}

/// `Set-Cookie` value remembering `locale` site-wide.
pub fn locale_cookie(name: &str, locale: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={locale}; Path=/; Max-Age=31536000; SameSite=Lax")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> Vec<String> {
        vec!["de".into(), "en".into()]
    }

    #[test]
    fn test_stored_locale_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc; locale=en; theme=dark"));
        assert_eq!(stored_locale(&headers, "locale", &locales()).as_deref(), Some("en"));
    }

    #[test]
    fn test_unknown_stored_locale_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("locale=fr"));
        assert_eq!(stored_locale(&headers, "locale", &locales()), None);
        assert_eq!(stored_locale(&HeaderMap::new(), "locale", &locales()), None);
    }

    #[test]
    fn test_cookie_value() {
        let value = locale_cookie("locale", "de").unwrap();
        assert!(value.to_str().unwrap().starts_with("locale=de; Path=/"));
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let events = LocaleEvents::default();
        let mut rx = events.subscribe();
        events.emit(LocaleChanged { from: Some("de".into()), to: "en".into() });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.to, "en");
    }
}
