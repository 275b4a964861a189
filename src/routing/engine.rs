//! Route expansion engine.
//!
//! # Responsibilities
//! - Walk the tree depth-first, children in insertion order
//! - Expand every (node, locale, action) into registered routes
//! - Enumerate parameter values and emit one route per combination
//! - Collect every issue of a pass and report them together
//!
//! # Design Decisions
//! - Output order is tree order, then locale order, then action order,
//!   then combination order; redirect search and the sitemap take the first match
//! - Unresolved segments and parameters are warnings; duplicates are fatal
//! - Expansion is pure given the same tree and sources

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{ActionSegments, LocaleConfig};
use crate::routing::middleware::resolve_middleware;
use crate::routing::params::{BoundParameters, ParameterSources, ParameterValues};
use crate::routing::route::{fill_placeholders, route_name, DispatchTarget, RegisteredRoute};
use crate::routing::segment::resolve_path;
use crate::tree::node::placeholders;
use crate::tree::{ActionKind, ActionName, HttpMethod, RouteAction, RouteNode, RouteTree};

/// Locale settings the engine needs.
#[derive(Debug, Clone)]
pub struct ExpansionOptions {
    pub locales: Vec<String>,
    pub action_segments: BTreeMap<String, ActionSegments>,
}

impl ExpansionOptions {
    pub fn new(locales: Vec<String>) -> Self {
        Self {
            locales,
            action_segments: BTreeMap::new(),
        }
    }

    /// SHA-256 over everything in the options that shapes the route set.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(&(&self.locales, &self.action_segments))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn segments_for(&self, locale: &str) -> ActionSegments {
        self.action_segments.get(locale).cloned().unwrap_or_default()
    }
}

impl From<&LocaleConfig> for ExpansionOptions {
    fn from(config: &LocaleConfig) -> Self {
        Self {
            locales: config.available.clone(),
            action_segments: config.action_segments.clone(),
        }
    }
}

/// A problem found during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum ExpansionIssue {
    #[error("node '{node}' has no segment for locale '{locale}'")]
    UnresolvedSegment { node: String, locale: String },

    #[error("node '{node}' ({locale}): parameter '{parameter}' unresolvable: {reason}")]
    UnresolvableParameter {
        node: String,
        locale: String,
        parameter: String,
        reason: String,
    },

    #[error("node '{node}' ({locale}): redirect target '{target}' does not resolve")]
    UnresolvedRedirect {
        node: String,
        locale: String,
        target: String,
    },

    #[error("duplicate route '{name}' at '{path}'")]
    DuplicateRouteName { name: String, path: String },
}

impl ExpansionIssue {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExpansionIssue::DuplicateRouteName { .. })
    }
}

/// Expansion aborted because of fatal issues. Carries every issue of the pass.
#[derive(Debug, Clone, Error)]
#[error("route expansion failed with {} fatal issue(s)", self.fatal().count())]
pub struct ExpansionError {
    pub issues: Vec<ExpansionIssue>,
}

impl ExpansionError {
    pub fn fatal(&self) -> impl Iterator<Item = &ExpansionIssue> {
        self.issues.iter().filter(|i| i.is_fatal())
    }
}

/// Successful expansion output.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub routes: Vec<RegisteredRoute>,
    /// Non-fatal issues.
    pub issues: Vec<ExpansionIssue>,
}

enum Enumeration {
    NoParameters,
    Combinations(Vec<BoundParameters>),
    Templated,
}

/// Expand `tree` into its ordered list of registered routes.
pub fn expand(
    tree: &RouteTree,
    sources: &ParameterSources,
    options: &ExpansionOptions,
) -> Result<Expansion, ExpansionError> {
    let mut expander = Expander {
        tree,
        sources,
        options,
        routes: Vec::new(),
        issues: Vec::new(),
        names: HashSet::new(),
        paths: HashSet::new(),
    };

    for node in tree.walk() {
        for locale in &options.locales {
            expander.expand_node(node, locale);
        }
    }

    let Expander { routes, issues, .. } = expander;
    for issue in &issues {
        tracing::warn!(issue = %issue, fatal = issue.is_fatal(), "Route expansion issue");
    }
    if issues.iter().any(ExpansionIssue::is_fatal) {
        return Err(ExpansionError { issues });
    }

    tracing::debug!(routes = routes.len(), warnings = issues.len(), "Route tree expanded");
    Ok(Expansion { routes, issues })
}

struct Expander<'a> {
    tree: &'a RouteTree,
    sources: &'a ParameterSources,
    options: &'a ExpansionOptions,
    routes: Vec<RegisteredRoute>,
    issues: Vec<ExpansionIssue>,
    names: HashSet<(String, Option<BoundParameters>)>,
    paths: HashSet<(HttpMethod, String)>,
}

impl<'a> Expander<'a> {
    fn expand_node(&mut self, node: &'a RouteNode, locale: &str) {
        let base = match resolve_path(self.tree, node, locale) {
            Ok(path) => path,
            Err(missing) => {
                if missing.node == node.id {
                    self.issues.push(ExpansionIssue::UnresolvedSegment {
                        node: node.id.clone(),
                        locale: locale.to_string(),
                    });
                } else {
                    tracing::debug!(node = %node.id, locale, origin = %missing.node, "Skipping node below unresolved segment");
                }
                return;
            }
        };
        if node.actions.is_empty() {
            return;
        }

        let enumeration = self.enumerate(node, locale, &base);
        for action in &node.actions {
            self.expand_action(node, action, locale, &base, &enumeration);
        }
    }

    fn enumerate(&mut self, node: &RouteNode, locale: &str, path: &str) -> Enumeration {
        let mut parameters: Vec<&str> = Vec::new();
        for name in placeholders(path) {
            if !parameters.contains(&name) {
                parameters.push(name);
            }
        }
        if parameters.is_empty() {
            return Enumeration::NoParameters;
        }

        let mut combinations = vec![BoundParameters::new()];
        for parameter in parameters {
            let Some(provider) = self.sources.binding_for(&node.id, parameter).and_then(|b| b.values()) else {
                self.unresolvable(node, locale, parameter, "no value source bound");
                return Enumeration::Templated;
            };

            let mut next = Vec::new();
            for bound in &combinations {
                match provider.list_values(locale, bound) {
                    Ok(ParameterValues::Values(values)) => {
                        for value in values {
                            let mut combination = bound.clone();
                            combination.insert(parameter.to_string(), value);
                            next.push(combination);
                        }
                    }
                    Ok(ParameterValues::Unbounded) => {
                        tracing::debug!(node = %node.id, locale, parameter, "Parameter unbounded, keeping pattern route");
                        return Enumeration::Templated;
                    }
                    Err(e) => {
                        self.unresolvable(node, locale, parameter, &e.to_string());
                        return Enumeration::Templated;
                    }
                }
            }
            combinations = next;
        }
        Enumeration::Combinations(combinations)
    }

    fn unresolvable(&mut self, node: &RouteNode, locale: &str, parameter: &str, reason: &str) {
        self.issues.push(ExpansionIssue::UnresolvableParameter {
            node: node.id.clone(),
            locale: locale.to_string(),
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        });
    }

    fn expand_action(
        &mut self,
        node: &RouteNode,
        action: &RouteAction,
        locale: &str,
        base: &str,
        enumeration: &Enumeration,
    ) {
        let segments = self.options.segments_for(locale);
        let path = match action.name {
            ActionName::Create => format!("{base}/{}", segments.create),
            ActionName::Edit => format!("{base}/{}", segments.edit),
            _ => base.to_string(),
        };
        let name = route_name(locale, &node.id, action.name);
        let middleware = resolve_middleware(self.tree, node, Some(action));

        let instances: Vec<(String, Option<BoundParameters>, bool)> = match enumeration {
            Enumeration::NoParameters => vec![(path, None, true)],
            Enumeration::Templated => vec![(path, None, false)],
            Enumeration::Combinations(list) => list
                .iter()
                .map(|keys| (fill_placeholders(&path, keys), Some(keys.clone()), true))
                .collect(),
        };

        for (path, route_keys, expandable) in instances {
            let Some(target) = self.dispatch_target(node, action, locale, route_keys.as_ref()) else {
                continue;
            };
            let route = RegisteredRoute {
                name: name.clone(),
                node: node.id.clone(),
                action: action.name,
                locale: locale.to_string(),
                path,
                methods: action.name.methods().to_vec(),
                target,
                middleware: middleware.clone(),
                route_keys,
                expandable,
            };
            self.register(route);
        }
    }

    fn dispatch_target(
        &mut self,
        node: &RouteNode,
        action: &RouteAction,
        locale: &str,
        keys: Option<&BoundParameters>,
    ) -> Option<DispatchTarget> {
        let target = match action.kind {
            ActionKind::Uses => DispatchTarget::Uses {
                controller: match self.tree.effective_namespace(node) {
                    Some(ns) => format!("{ns}::{}", action.value),
                    None => action.value.clone(),
                },
            },
            ActionKind::View => DispatchTarget::View {
                view: action.value.clone(),
            },
            ActionKind::Closure => DispatchTarget::Closure {
                closure: action.value.clone(),
            },
            ActionKind::Redirect => {
                let status = action.redirect_status.unwrap_or(302);
                match self.redirect_path(&action.value, locale, keys) {
                    Some(to) => DispatchTarget::Redirect { to, status },
                    None => {
                        self.issues.push(ExpansionIssue::UnresolvedRedirect {
                            node: node.id.clone(),
                            locale: locale.to_string(),
                            target: action.value.clone(),
                        });
                        return None;
                    }
                }
            }
        };
        Some(target)
    }

    /// Absolute paths pass through; anything else names a node.
    fn redirect_path(&self, value: &str, locale: &str, keys: Option<&BoundParameters>) -> Option<String> {
        if value.starts_with('/') || value.contains("://") {
            return Some(value.to_string());
        }
        let target = self.tree.get_node(value)?;
        let path = resolve_path(self.tree, target, locale).ok()?;
        let path = match keys {
            Some(keys) => fill_placeholders(&path, keys),
            None => path,
        };
        // Concrete routes must not redirect to a pattern.
        if keys.is_some() && !placeholders(&path).is_empty() {
            return None;
        }
        Some(format!("/{path}"))
    }

    fn register(&mut self, route: RegisteredRoute) {
        let name_key = (route.name.clone(), route.route_keys.clone());
        let path_key = pattern_key(&route.path);
        let duplicate_path = route
            .methods
            .iter()
            .any(|m| self.paths.contains(&(*m, path_key.clone())));
        if duplicate_path || self.names.contains(&name_key) {
            self.issues.push(ExpansionIssue::DuplicateRouteName {
                name: route.name,
                path: route.path,
            });
            return;
        }

        self.names.insert(name_key);
        for method in &route.methods {
            self.paths.insert((*method, path_key.clone()));
        }
        self.routes.push(route);
    }
}

/// `path` with every placeholder name erased, so `en/{slug}` and
/// `en/{name}` compare equal.
fn pattern_key(path: &str) -> String {
    let mut key = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        key.push_str(&rest[..=start]);
        key.push('}');
        rest = &rest[start + end + 1..];
    }
    key.push_str(rest);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::params::{ParameterBinding, ProvidesValues, SourceError};
    use crate::tree::NodeDefinition;
    use serde_json::json;
    use std::sync::Arc;

    fn tree(value: serde_json::Value) -> RouteTree {
        RouteTree::from_definition(NodeDefinition::from_value(value).unwrap()).unwrap()
    }

    fn options() -> ExpansionOptions {
        ExpansionOptions::new(vec!["de".into(), "en".into()])
    }

    fn paths(routes: &[RegisteredRoute]) -> Vec<&str> {
        routes.iter().map(|r| r.path.as_str()).collect()
    }

    struct Unbounded;

    impl ProvidesValues for Unbounded {
        fn list_values(&self, _: &str, _: &BoundParameters) -> Result<ParameterValues, SourceError> {
            Ok(ParameterValues::Unbounded)
        }
    }

    /// Items depend on the bound category.
    struct ItemsByCategory;

    impl ProvidesValues for ItemsByCategory {
        fn list_values(&self, _: &str, bound: &BoundParameters) -> Result<ParameterValues, SourceError> {
            let category = bound.get("category").ok_or_else(|| SourceError::Provider("unbound".into()))?;
            Ok(ParameterValues::Values(vec![format!("{category}-1"), format!("{category}-2")]))
        }
    }

    #[test]
    fn test_order_is_tree_then_locale_then_action() {
        let tree = tree(json!({
            "get": { "view": "home" },
            "children": {
                "products": {
                    "segment": { "de": "produkte", "en": "products" },
                    "index": "ProductController@index",
                    "create": "ProductController@create",
                },
                "about": { "segment": { "de": "ueber", "en": "about" }, "get": { "view": "about" } },
            }
        }));
        let expansion = expand(&tree, &ParameterSources::new(), &options()).unwrap();

        assert_eq!(
            paths(&expansion.routes),
            vec![
                "de",
                "en",
                "de/produkte",
                "de/produkte/create",
                "en/products",
                "en/products/create",
                "de/ueber",
                "en/about",
            ]
        );
        assert_eq!(expansion.routes[2].name, "de.products.index");
        assert_eq!(expansion.routes[0].name, "de");
        assert!(expansion.issues.is_empty());
    }

    #[test]
    fn test_cartesian_product_order() {
        let tree = tree(json!({
            "children": {
                "letters": {
                    "segment": "{letter}",
                    "values": { "de": ["a", "b"], "en": ["a", "b"] },
                    "children": {
                        "numbers": {
                            "segment": "{number}",
                            "values": { "de": ["1", "2"], "en": ["1", "2"] },
                            "get": { "view": "pair" },
                        }
                    }
                }
            }
        }));
        let sources = ParameterSources::from_tree(&tree);
        let expansion = expand(&tree, &sources, &options()).unwrap();

        let de: Vec<_> = expansion.routes.iter().filter(|r| r.locale == "de").collect();
        assert_eq!(de.len(), 4);
        let pairs: Vec<_> = de
            .iter()
            .map(|r| {
                let keys = r.route_keys.as_ref().unwrap();
                (keys["letter"].as_str(), keys["number"].as_str())
            })
            .collect();
        assert_eq!(pairs, vec![("a", "1"), ("a", "2"), ("b", "1"), ("b", "2")]);
        assert_eq!(de[1].path, "de/a/2");
    }

    #[test]
    fn test_dependent_parameters_receive_bound_values() {
        let tree = tree(json!({
            "children": {
                "category": {
                    "segment": "{category}",
                    "values": { "en": ["tools"] },
                    "children": { "item": { "segment": "{item}", "show": "ItemController@show" } }
                }
            }
        }));
        let mut sources = ParameterSources::from_tree(&tree);
        sources.bind("item", ParameterBinding::new().with_values(Arc::new(ItemsByCategory)));

        let expansion = expand(&tree, &sources, &ExpansionOptions::new(vec!["en".into()])).unwrap();
        assert_eq!(paths(&expansion.routes), vec!["en/tools/tools-1", "en/tools/tools-2"]);
    }

    #[test]
    fn test_unbounded_parameter_keeps_pattern() {
        let tree = tree(json!({
            "children": { "article": { "segment": "{slug}", "show": "ArticleController@show" } }
        }));
        let mut sources = ParameterSources::new();
        sources.bind("slug", ParameterBinding::new().with_values(Arc::new(Unbounded)));

        let expansion = expand(&tree, &sources, &options()).unwrap();
        assert_eq!(paths(&expansion.routes), vec!["de/{slug}", "en/{slug}"]);
        assert!(expansion.routes.iter().all(|r| !r.expandable && r.route_keys.is_none()));
        assert!(expansion.issues.is_empty());
    }

    #[test]
    fn test_missing_source_is_a_warning() {
        let tree = tree(json!({
            "children": { "article": { "segment": "{slug}", "show": "ArticleController@show" } }
        }));
        let expansion = expand(&tree, &ParameterSources::new(), &options()).unwrap();
        assert_eq!(expansion.routes.len(), 2);
        assert!(matches!(
            &expansion.issues[0],
            ExpansionIssue::UnresolvableParameter { parameter, .. } if parameter == "slug"
        ));
    }

    #[test]
    fn test_unresolved_segment_skips_node_and_descendants() {
        let tree = tree(json!({
            "children": {
                "news": {
                    "segment": { "de": "neuigkeiten" },
                    "get": { "view": "news" },
                    "children": { "archive": { "get": { "view": "archive" } } }
                }
            }
        }));
        let expansion = expand(&tree, &ParameterSources::new(), &options()).unwrap();
        assert_eq!(paths(&expansion.routes), vec!["de/neuigkeiten", "de/neuigkeiten/archive"]);
        assert_eq!(
            expansion.issues,
            vec![ExpansionIssue::UnresolvedSegment { node: "news".into(), locale: "en".into() }]
        );
    }

    #[test]
    fn test_duplicate_paths_are_fatal_and_aggregated() {
        let tree = tree(json!({
            "children": {
                "a": { "segment": "same", "get": { "view": "a" } },
                "b": { "segment": "same", "get": { "view": "b" } },
                "c": { "segment": { "de": "nur-de" }, "get": { "view": "c" } },
            }
        }));
        let err = expand(&tree, &ParameterSources::new(), &options()).unwrap_err();
        assert_eq!(err.fatal().count(), 2);
        assert!(err
            .issues
            .iter()
            .any(|i| matches!(i, ExpansionIssue::UnresolvedSegment { node, .. } if node == "c")));
    }

    #[test]
    fn test_templated_paths_differing_only_in_placeholder_names_collide() {
        let tree = tree(json!({
            "children": {
                "article": { "segment": "{slug}", "show": "ArticleController@show" },
                "user": { "segment": "{name}", "show": "UserController@show" },
            }
        }));
        let err = expand(&tree, &ParameterSources::new(), &options()).unwrap_err();
        let duplicates: Vec<_> = err
            .fatal()
            .map(|i| match i {
                ExpansionIssue::DuplicateRouteName { name, .. } => name.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(duplicates, vec!["de.user.show", "en.user.show"]);
    }

    #[test]
    fn test_pattern_key_erases_placeholder_names() {
        assert_eq!(pattern_key("en/{slug}/edit"), "en/{}/edit");
        assert_eq!(pattern_key("en/{a}/{b}"), "en/{}/{}");
        assert_eq!(pattern_key("en/plain"), "en/plain");
        assert_eq!(pattern_key("en/{open"), "en/{open");
    }

    #[test]
    fn test_same_parameter_name_on_two_nodes_keeps_own_values() {
        let tree = tree(json!({
            "children": {
                "products": {
                    "children": { "product": {
                        "segment": "{id}",
                        "values": { "en": ["p1", "p2"] },
                        "show": "ProductController@show",
                    } }
                },
                "articles": {
                    "children": { "article": {
                        "segment": "{id}",
                        "values": { "en": ["a1"] },
                        "show": "ArticleController@show",
                    } }
                },
            }
        }));
        let sources = ParameterSources::from_tree(&tree);
        let expansion = expand(&tree, &sources, &ExpansionOptions::new(vec!["en".into()])).unwrap();
        assert_eq!(
            paths(&expansion.routes),
            vec!["en/products/p1", "en/products/p2", "en/articles/a1"]
        );
        assert!(expansion.issues.is_empty());
    }

    #[test]
    fn test_redirect_targets_resolve_per_locale() {
        let tree = tree(json!({
            "children": {
                "target": { "segment": { "de": "ziel", "en": "target" }, "get": { "view": "target" } },
                "old": { "get": { "redirect": "target", "status": 301 } },
                "external": { "get": { "redirect": "/legacy/page" } },
                "broken": { "get": { "redirect": "nowhere" } },
            }
        }));
        let expansion = expand(&tree, &ParameterSources::new(), &options()).unwrap();

        let old_en = expansion.routes.iter().find(|r| r.name == "en.old").unwrap();
        assert_eq!(old_en.target, DispatchTarget::Redirect { to: "/en/target".into(), status: 301 });
        let external = expansion.routes.iter().find(|r| r.name == "de.external").unwrap();
        assert_eq!(external.target, DispatchTarget::Redirect { to: "/legacy/page".into(), status: 302 });
        assert!(expansion.routes.iter().all(|r| r.node != "broken"));
        assert_eq!(expansion.issues.len(), 2);
    }

    #[test]
    fn test_localized_action_suffixes_and_namespace() {
        let tree = tree(json!({
            "namespace": "shop",
            "children": { "orders": { "create": "OrderController@create" } }
        }));
        let mut options = options();
        options.action_segments.insert(
            "de".into(),
            ActionSegments { create: "erstellen".into(), edit: "bearbeiten".into() },
        );
        let expansion = expand(&tree, &ParameterSources::new(), &options).unwrap();
        assert_eq!(paths(&expansion.routes), vec!["de/orders/erstellen", "en/orders/create"]);
        assert_eq!(
            expansion.routes[0].target,
            DispatchTarget::Uses { controller: "shop::OrderController@create".into() }
        );
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let tree = tree(json!({
            "get": { "view": "home" },
            "children": {
                "flowers": {
                    "segment": "{flower}",
                    "values": { "de": ["rose", "tulpe"], "en": ["rose-en", "tulip"] },
                    "show": "FlowerController@show",
                }
            }
        }));
        let sources = ParameterSources::from_tree(&tree);
        let first = expand(&tree, &sources, &options()).unwrap();
        let second = expand(&tree, &sources, &options()).unwrap();
        assert_eq!(
            serde_json::to_vec(&first.routes).unwrap(),
            serde_json::to_vec(&second.routes).unwrap()
        );
    }
}
