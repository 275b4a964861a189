//! Route node model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tree::action::{ActionName, RouteAction};

/// Arena handle of a node inside its [`RouteTree`](crate::tree::RouteTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(pub(crate) usize);

impl NodeRef {
    pub const ROOT: NodeRef = NodeRef(0);
}

/// The URL segment contributed by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Same segment for every locale.
    Uniform(String),
    /// One segment per locale.
    PerLocale(BTreeMap<String, String>),
}

impl Segment {
    /// Every distinct segment string this node may produce.
    pub fn variants(&self) -> Vec<&str> {
        match self {
            Segment::Uniform(s) => vec![s.as_str()],
            Segment::PerLocale(map) => map.values().map(String::as_str).collect(),
        }
    }
}

/// Sitemap change frequency hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

/// Per-node sitemap settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapSettings {
    pub excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFreq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
}

/// One middleware declaration on a node or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiddlewareEntry {
    pub parameters: Vec<String>,
    /// Passed down to descendant nodes.
    pub inherit: bool,
    /// Removes an earlier entry of the same name instead of adding one.
    pub skip: bool,
}

impl Default for MiddlewareEntry {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            inherit: true,
            skip: false,
        }
    }
}

impl MiddlewareEntry {
    pub fn skip() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }
}

/// One node in the site hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    /// Dot-separated path from the root; empty for the root itself.
    pub id: String,
    pub name: String,
    pub parent: Option<NodeRef>,
    /// Children in insertion order.
    pub children: Vec<NodeRef>,
    pub segment: Segment,
    /// Set when the segment is a placeholder.
    pub parameter: Option<String>,
    pub inherit_path: bool,
    pub namespace: Option<String>,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub sitemap: SitemapSettings,
    pub middleware: Vec<(String, MiddlewareEntry)>,
    pub actions: Vec<RouteAction>,
    /// Static per-locale parameter values declared alongside the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, Vec<String>>>,
}

impl RouteNode {
    pub(crate) fn new(id: String, name: String, parent: Option<NodeRef>) -> Self {
        let segment = Segment::Uniform(if parent.is_some() { name.clone() } else { String::new() });
        Self {
            id,
            name,
            parent,
            children: Vec::new(),
            segment,
            parameter: None,
            inherit_path: true,
            namespace: None,
            data: serde_json::Map::new(),
            sitemap: SitemapSettings::default(),
            middleware: Vec::new(),
            actions: Vec::new(),
            values: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn action(&self, name: ActionName) -> Option<&RouteAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Insert or replace an action, keeping declaration order.
    pub(crate) fn put_action(&mut self, action: RouteAction) {
        match self.actions.iter_mut().find(|a| a.name == action.name) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    pub(crate) fn put_middleware(&mut self, name: String, entry: MiddlewareEntry) {
        put_middleware(&mut self.middleware, name, entry);
    }
}

/// Insert or replace a middleware declaration within one level.
pub(crate) fn put_middleware(
    list: &mut Vec<(String, MiddlewareEntry)>,
    name: String,
    entry: MiddlewareEntry,
) {
    match list.iter_mut().find(|(n, _)| *n == name) {
        Some((_, existing)) => *existing = entry,
        None => list.push((name, entry)),
    }
}

/// Names of all `{placeholder}`s in `path`, left to right.
pub fn placeholders(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                names.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}
