//! Ordered collection of registered routes with name-based URL generation.

use serde::{Deserialize, Serialize};

use crate::routing::params::{BoundParameters, ParameterSources};
use crate::routing::route::{fill_placeholders, RegisteredRoute};

/// Registered routes in expansion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteSet {
    routes: Vec<RegisteredRoute>,
}

impl RouteSet {
    pub fn new(routes: Vec<RegisteredRoute>) -> Self {
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegisteredRoute> {
        self.routes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RegisteredRoute> {
        self.routes.get(index)
    }

    pub fn as_slice(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    /// Route registered under `name` for exactly these keys.
    pub fn find(&self, name: &str, keys: &BoundParameters) -> Option<&RegisteredRoute> {
        self.routes.iter().find(|r| {
            r.name == name
                && match &r.route_keys {
                    Some(route_keys) => route_keys == keys,
                    None => keys.is_empty() || r.is_templated(),
                }
        })
    }

    /// Absolute path of the route `name` with `keys`.
    ///
    /// Concrete routes are preferred; a templated route is filled in.
    /// Returns `None` if the result would still contain placeholders.
    pub fn url_for(&self, name: &str, keys: &BoundParameters) -> Option<String> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name == name && r.route_keys.as_ref() == Some(keys))
            .or_else(|| self.find(name, keys))?;

        let url = fill_placeholders(&route.url(), keys);
        if url.contains('{') {
            return None;
        }
        Some(url)
    }

    /// The equivalent of `route` in locale `to`, translating its parameter values.
    ///
    /// `params` are the values the request was matched with.
    pub fn switch_locale(
        &self,
        route: &RegisteredRoute,
        params: &BoundParameters,
        to: &str,
        sources: &ParameterSources,
    ) -> Option<String> {
        let mut translated = BoundParameters::new();
        for (parameter, value) in params {
            match sources.translate(&route.node, parameter, value, &route.locale, to) {
                Ok(Some(value)) => {
                    translated.insert(parameter.clone(), value);
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::debug!(parameter = %parameter, error = %e, "Parameter translation failed");
                    return None;
                }
            }
        }

        let name = match route.name.split_once('.') {
            Some((_, rest)) => format!("{to}.{rest}"),
            None => to.to_string(),
        };
        self.url_for(&name, &translated)
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a RegisteredRoute;
    type IntoIter = std::slice::Iter<'a, RegisteredRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::engine::{expand, ExpansionOptions};
    use crate::tree::{NodeDefinition, RouteTree};
    use serde_json::json;

    fn compiled() -> (RouteSet, ParameterSources) {
        let tree = RouteTree::from_definition(
            NodeDefinition::from_value(json!({
                "get": { "view": "home" },
                "children": {
                    "flowers": {
                        "segment": { "de": "blumen", "en": "flowers" },
                        "index": "FlowerController@index",
                        "children": {
                            "flower": {
                                "segment": "{flower}",
                                "values": { "de": ["rose", "tulpe", "nelke"], "en": ["rose-en", "tulip"] },
                                "show": "FlowerController@show",
                            }
                        }
                    },
                    "search": { "segment": "{query}", "get": { "view": "search" } },
                }
            }))
            .unwrap(),
        )
        .unwrap();
        let sources = ParameterSources::from_tree(&tree);
        let expansion = expand(&tree, &sources, &ExpansionOptions::new(vec!["de".into(), "en".into()])).unwrap();
        (RouteSet::new(expansion.routes), sources)
    }

    fn keys(pairs: &[(&str, &str)]) -> BoundParameters {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_url_for_concrete_route() {
        let (routes, _) = compiled();
        assert_eq!(routes.url_for("de.flowers.index", &BoundParameters::new()).as_deref(), Some("/de/blumen"));
        assert_eq!(
            routes.url_for("en.flowers.flower.show", &keys(&[("flower", "tulip")])).as_deref(),
            Some("/en/flowers/tulip")
        );
        assert_eq!(routes.url_for("en.flowers.flower.show", &keys(&[("flower", "nelke")])), None);
    }

    #[test]
    fn test_url_for_fills_templated_route() {
        let (routes, _) = compiled();
        assert_eq!(routes.url_for("de.search", &keys(&[("query", "tulpen")])).as_deref(), Some("/de/tulpen"));
        assert_eq!(routes.url_for("de.search", &BoundParameters::new()), None);
    }

    #[test]
    fn test_switch_locale_translates_values() {
        let (routes, sources) = compiled();
        let params = keys(&[("flower", "rose-en")]);
        let route = routes.find("en.flowers.flower.show", &params).unwrap();
        assert_eq!(routes.switch_locale(route, &params, "de", &sources).as_deref(), Some("/de/blumen/rose"));
    }

    #[test]
    fn test_switch_locale_without_counterpart() {
        let (routes, sources) = compiled();
        let params = keys(&[("flower", "nelke")]);
        let route = routes.find("de.flowers.flower.show", &params).unwrap();
        assert_eq!(routes.switch_locale(route, &params, "en", &sources), None);
    }

    #[test]
    fn test_switch_locale_for_root() {
        let (routes, sources) = compiled();
        let route = routes.find("en", &BoundParameters::new()).unwrap();
        assert_eq!(routes.switch_locale(route, &BoundParameters::new(), "de", &sources).as_deref(), Some("/de"));
    }
}
