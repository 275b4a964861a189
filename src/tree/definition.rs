//! Declarative tree definitions.
//!
//! A definition is a nested mapping keyed by node name. Known keys configure
//! the node; action names (`index`, `show`, ...) declare actions; everything
//! under `children` recurses. Key order is preserved and drives expansion
//! order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::tree::action::{ActionKind, ActionName, RouteAction};
use crate::tree::error::TreeError;
use crate::tree::node::{MiddlewareEntry, Segment, SitemapSettings};

/// One node of a declarative tree, children still unparsed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeDefinition {
    pub segment: Option<Segment>,
    pub namespace: Option<String>,
    #[serde(alias = "inheritPath")]
    pub inherit_path: Option<bool>,
    pub middleware: Map<String, Value>,
    pub data: Map<String, Value>,
    pub sitemap: Option<SitemapSettings>,
    pub values: Option<BTreeMap<String, Vec<String>>>,
    pub children: Map<String, Value>,
    /// Remaining keys; each must be an action name.
    #[serde(flatten)]
    pub actions: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ActionDefinition {
    /// `show = "ProductController@show"` shorthand for `uses`.
    Short(String),
    Full(ActionSpec),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ActionSpec {
    uses: Option<String>,
    view: Option<String>,
    closure: Option<String>,
    redirect: Option<String>,
    status: Option<u16>,
    middleware: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MiddlewareDefinition {
    /// `auth = true` enables, `auth = false` skips.
    Flag(bool),
    Params(Vec<String>),
    Detailed {
        #[serde(default)]
        parameters: Vec<String>,
        #[serde(default = "default_inherit")]
        inherit: bool,
        #[serde(default)]
        skip: bool,
    },
}

fn default_inherit() -> bool {
    true
}

impl NodeDefinition {
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse the action keys of this definition, in declaration order.
    pub fn parse_actions(&self, node: &str) -> Result<Vec<RouteAction>, TreeError> {
        self.actions
            .iter()
            .map(|(key, value)| {
                let name: ActionName = key.parse().map_err(|_| TreeError::UnknownKey {
                    node: node.to_string(),
                    key: key.clone(),
                })?;
                parse_action(node, name, value.clone())
            })
            .collect()
    }

    pub fn parse_middleware(&self, node: &str) -> Result<Vec<(String, MiddlewareEntry)>, TreeError> {
        parse_middleware(node, &self.middleware)
    }

    /// Child definitions in declaration order.
    pub fn parse_children(&self) -> Result<Vec<(String, NodeDefinition)>, TreeError> {
        self.children
            .iter()
            .map(|(name, value)| Ok((name.clone(), NodeDefinition::from_value(value.clone())?)))
            .collect()
    }
}

fn parse_action(node: &str, name: ActionName, value: Value) -> Result<RouteAction, TreeError> {
    let invalid = |reason: &str| TreeError::InvalidAction {
        node: node.to_string(),
        action: name.to_string(),
        reason: reason.to_string(),
    };

    let spec = match serde_json::from_value::<ActionDefinition>(value)
        .map_err(|e| invalid(&e.to_string()))?
    {
        ActionDefinition::Short(uses) => ActionSpec {
            uses: Some(uses),
            ..ActionSpec::default()
        },
        ActionDefinition::Full(spec) => spec,
    };

    let targets = [
        (ActionKind::Uses, spec.uses),
        (ActionKind::View, spec.view),
        (ActionKind::Closure, spec.closure),
        (ActionKind::Redirect, spec.redirect),
    ];
    let mut declared = targets.into_iter().filter_map(|(kind, v)| v.map(|v| (kind, v)));
    let (kind, target) = declared
        .next()
        .ok_or_else(|| invalid("one of uses, view, closure or redirect is required"))?;
    if declared.next().is_some() {
        return Err(invalid("only one of uses, view, closure or redirect may be set"));
    }
    if spec.status.is_some() && kind != ActionKind::Redirect {
        return Err(invalid("status is only valid on redirect actions"));
    }
    if let Some(status) = spec.status {
        if !matches!(status, 301 | 302 | 303 | 307 | 308) {
            return Err(invalid(&format!("unsupported redirect status {status}")));
        }
    }

    let mut action = RouteAction::new(name, kind, target);
    action.middleware = parse_middleware(node, &spec.middleware)?;
    action.redirect_status = spec.status;
    Ok(action)
}

pub(crate) fn parse_middleware(
    node: &str,
    map: &Map<String, Value>,
) -> Result<Vec<(String, MiddlewareEntry)>, TreeError> {
    map.iter()
        .map(|(name, value)| {
            let def = serde_json::from_value::<MiddlewareDefinition>(value.clone()).map_err(|e| {
                TreeError::InvalidMiddleware {
                    node: node.to_string(),
                    middleware: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let entry = match def {
                MiddlewareDefinition::Flag(true) => MiddlewareEntry::default(),
                MiddlewareDefinition::Flag(false) => MiddlewareEntry::skip(),
                MiddlewareDefinition::Params(parameters) => MiddlewareEntry {
                    parameters,
                    ..MiddlewareEntry::default()
                },
                MiddlewareDefinition::Detailed {
                    parameters,
                    inherit,
                    skip,
                } => MiddlewareEntry {
                    parameters,
                    inherit,
                    skip,
                },
            };
            Ok((name.clone(), entry))
        })
        .collect()
}

/// Load a root definition from a `.toml` or `.json` file.
pub fn load_definition(path: &Path) -> Result<NodeDefinition, TreeError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml_definition(&content),
        Some("json") => parse_json_definition(&content),
        _ => Err(TreeError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn parse_toml_definition(content: &str) -> Result<NodeDefinition, TreeError> {
    let value: Value = toml::from_str(content)?;
    NodeDefinition::from_value(value)
}

pub fn parse_json_definition(content: &str) -> Result<NodeDefinition, TreeError> {
    let value: Value = serde_json::from_str(content)?;
    NodeDefinition::from_value(value)
}
