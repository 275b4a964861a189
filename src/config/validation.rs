//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check locale settings are self-consistent
//! - Check exactly one tree source is configured
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SiteConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no locales configured")]
    NoLocales,

    #[error("locale '{0}' is configured more than once")]
    DuplicateLocale(String),

    #[error("default locale '{0}' is not in the available locales")]
    UnknownDefaultLocale(String),

    #[error("action segments configured for unknown locale '{0}'")]
    UnknownActionSegmentLocale(String),

    #[error("exactly one of tree.definition or tree.rows must be set")]
    TreeSource,

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("admin API enabled with the placeholder api key")]
    PlaceholderApiKey,

    #[error("invalid sitemap base url '{0}'")]
    SitemapBaseUrl(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let locales = &config.locales;
    if locales.available.is_empty() {
        errors.push(ValidationError::NoLocales);
    }

    let mut seen = HashSet::new();
    for locale in &locales.available {
        if !seen.insert(locale.as_str()) {
            errors.push(ValidationError::DuplicateLocale(locale.clone()));
        }
    }

    if !locales.is_available(&locales.default) {
        errors.push(ValidationError::UnknownDefaultLocale(locales.default.clone()));
    }

    for locale in locales.action_segments.keys() {
        if !locales.is_available(locale) {
            errors.push(ValidationError::UnknownActionSegmentLocale(locale.clone()));
        }
    }

    if config.tree.definition.is_some() == config.tree.rows.is_some() {
        errors.push(ValidationError::TreeSource);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.admin.enabled && config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
        errors.push(ValidationError::PlaceholderApiKey);
    }

    match url::Url::parse(&config.sitemap.base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::SitemapBaseUrl(config.sitemap.base_url.clone())),
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
