//! Request-time path matching over registered routes.
//!
//! # Design Decisions
//! - One `matchit` router per HTTP method, values are indices into the `RouteSet`
//! - Static segments win over placeholders at the same position
//! - The first route registered for a (method, path) pair wins; later ones are logged
//! - Paths are matched as received; no percent-decoding

use std::collections::HashMap;

use matchit::Router as MatchitRouter;

use crate::routing::params::BoundParameters;
use crate::routing::set::RouteSet;
use crate::tree::HttpMethod;

/// A matched route and the placeholder values extracted from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub index: usize,
    pub params: BoundParameters,
}

/// Path lookup structure built from a `RouteSet`.
#[derive(Debug, Default)]
pub struct RouteIndex {
    by_method: HashMap<HttpMethod, MatchitRouter<usize>>,
}

impl RouteIndex {
    pub fn build(routes: &RouteSet) -> Self {
        let mut by_method: HashMap<HttpMethod, MatchitRouter<usize>> = HashMap::new();
        for (index, route) in routes.iter().enumerate() {
            let path = route.url();
            for method in &route.methods {
                let router = by_method.entry(*method).or_insert_with(MatchitRouter::new);
                if let Err(e) = router.insert(path.clone(), index) {
                    tracing::warn!(
                        route = %route.name,
                        method = %method,
                        path = %path,
                        error = %e,
                        "Route shadowed by an earlier registration"
                    );
                }
            }
        }
        Self { by_method }
    }

    /// Match `path` (with or without leading slash) for `method`.
    pub fn lookup(&self, method: HttpMethod, path: &str) -> Option<RouteMatch> {
        let router = self.by_method.get(&method)?;
        let trimmed = path.trim_matches('/');
        let normalized = format!("/{trimmed}");
        let matched = router.at(&normalized).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some(RouteMatch {
            index: *matched.value,
            params,
        })
    }
}
