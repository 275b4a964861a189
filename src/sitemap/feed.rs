//! Sitemap entry generation.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use crate::config::SitemapConfig;
use crate::routing::RouteSet;
use crate::tree::{ChangeFreq, RouteTree};

/// One `<url>` of the sitemap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFreq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
}

/// Entries for every GET, non-redirect, fully expanded route.
///
/// Routes of excluded nodes and routes carrying a deny-listed middleware
/// are left out. The first route for a path wins.
pub fn sitemap_entries(
    tree: &RouteTree,
    routes: &RouteSet,
    config: &SitemapConfig,
) -> Result<Vec<SitemapEntry>, url::ParseError> {
    let base = base_url(&config.base_url)?;
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for route in routes {
        if !route.is_get() || route.is_redirect() || !route.expandable || route.is_templated() {
            continue;
        }
        if config.exclude_middleware.iter().any(|m| route.has_middleware(m)) {
            continue;
        }
        let Some(node) = tree.get_node(&route.node) else {
            continue;
        };
        if node.sitemap.excluded || !seen.insert(route.path.as_str()) {
            continue;
        }

        entries.push(SitemapEntry {
            loc: base.join(&route.path)?.to_string(),
            lastmod: node.sitemap.lastmod.clone(),
            changefreq: node.sitemap.changefreq,
            priority: node.sitemap.priority,
        });
    }

    tracing::debug!(entries = entries.len(), "Sitemap generated");
    Ok(entries)
}

/// Joining replaces the last segment unless the base ends with a slash.
fn base_url(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}
