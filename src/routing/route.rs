//! Registered routes: the flat output of expansion.

use serde::{Deserialize, Serialize};

use crate::routing::middleware::ResolvedMiddleware;
use crate::routing::params::BoundParameters;
use crate::tree::node::placeholders;
use crate::tree::{ActionName, HttpMethod};

/// What a matched route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DispatchTarget {
    Uses { controller: String },
    View { view: String },
    Closure { closure: String },
    /// `to` is a path with a leading slash; placeholders are filled from the request.
    Redirect { to: String, status: u16 },
}

/// One fully expanded (node, action, locale, parameter values) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredRoute {
    pub name: String,
    pub node: String,
    pub action: ActionName,
    pub locale: String,
    /// Locale-prefixed path without leading slash.
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub target: DispatchTarget,
    pub middleware: Vec<ResolvedMiddleware>,
    /// Concrete parameter values; `None` if the route has none or stays templated.
    pub route_keys: Option<BoundParameters>,
    /// False when a parameter could not be enumerated and the path is a pattern.
    pub expandable: bool,
}

impl RegisteredRoute {
    /// Path as served, with leading slash.
    pub fn url(&self) -> String {
        format!("/{}", self.path)
    }

    pub fn is_get(&self) -> bool {
        self.methods.contains(&HttpMethod::Get)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.target, DispatchTarget::Redirect { .. })
    }

    pub fn is_templated(&self) -> bool {
        !placeholders(&self.path).is_empty()
    }

    pub fn has_middleware(&self, name: &str) -> bool {
        self.middleware.iter().any(|m| m.name == name)
    }
}

/// `<locale>.<node>.<action>`, skipping empty parts and the implicit `get`.
pub fn route_name(locale: &str, node: &str, action: ActionName) -> String {
    let action = (!action.is_implicit_default()).then(|| action.as_str());
    [Some(locale), Some(node), action]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Replace every `{name}` in `template` that has a value in `params`.
pub fn fill_placeholders(template: &str, params: &BoundParameters) -> String {
    let mut filled = template.to_string();
    for (name, value) in params {
        filled = filled.replace(&format!("{{{name}}}"), value);
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_names() {
        assert_eq!(route_name("de", "products", ActionName::Index), "de.products.index");
        assert_eq!(route_name("de", "products", ActionName::Get), "de.products");
        assert_eq!(route_name("en", "", ActionName::Get), "en");
        assert_eq!(route_name("en", "", ActionName::Post), "en.post");
    }

    #[test]
    fn test_fill_placeholders() {
        let params = BoundParameters::from([
            ("category".to_string(), "roses".to_string()),
            ("item".to_string(), "red".to_string()),
        ]);
        assert_eq!(fill_placeholders("de/{category}/{item}", &params), "de/roses/red");
        assert_eq!(fill_placeholders("de/{other}", &params), "de/{other}");
    }

    #[test]
    fn test_dispatch_target_serialization() {
        let target = DispatchTarget::Redirect { to: "/de/ziel".into(), status: 302 };
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["type"], "redirect");
        assert_eq!(json["to"], "/de/ziel");
    }
}
