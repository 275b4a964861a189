//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the localized site.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Configured locales and locale negotiation settings.
    pub locales: LocaleConfig,

    /// Where the route tree is read from.
    pub tree: TreeSourceConfig,

    /// Compiled tree cache.
    pub cache: CacheConfig,

    /// Sitemap feed settings.
    pub sitemap: SitemapConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Configured locales in expansion order.
    pub available: Vec<String>,

    /// Locale used when nothing else applies.
    pub default: String,

    /// Cookie carrying the locale between requests.
    pub cookie_name: String,

    /// Localized `create` / `edit` path suffixes, keyed by locale.
    pub action_segments: BTreeMap<String, ActionSegments>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            available: vec!["en".to_string()],
            default: "en".to_string(),
            cookie_name: "locale".to_string(),
            action_segments: BTreeMap::new(),
        }
    }
}

/// Path suffixes appended for the `create` and `edit` actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionSegments {
    pub create: String,
    pub edit: String,
}

impl Default for ActionSegments {
    fn default() -> Self {
        Self {
            create: "create".to_string(),
            edit: "edit".to_string(),
        }
    }
}

/// Route tree source. Exactly one of `definition` or `rows` must be set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TreeSourceConfig {
    /// Declarative tree file (`.toml` or `.json`).
    pub definition: Option<String>,

    /// JSON dump of the persisted node/action tables.
    pub rows: Option<String>,
}

/// Compiled tree cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Read and write the cache blob.
    pub enabled: bool,

    /// Location of the cache blob.
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "cache/route-tree.json".to_string(),
        }
    }
}

/// Sitemap feed configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Absolute base URL prepended to every sitemap entry.
    pub base_url: String,

    /// Routes carrying any of these middleware are left out.
    pub exclude_middleware: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            exclude_middleware: vec!["auth".to_string()],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

impl LocaleConfig {
    /// Suffixes for `locale`, falling back to the English defaults.
    pub fn action_segments_for(&self, locale: &str) -> ActionSegments {
        self.action_segments.get(locale).cloned().unwrap_or_default()
    }

    /// Returns true if `locale` is one of the configured locales.
    pub fn is_available(&self, locale: &str) -> bool {
        self.available.iter().any(|l| l == locale)
    }
}
