//! Request-scoped routing context.
//!
//! Everything a handler needs to know about the current request's route and
//! locale travels in this value; nothing is stored process-wide.

use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::{Map, Value};

use crate::locale::LocaleSource;
use crate::routing::{BoundParameters, CompiledRoutes, RegisteredRoute, RouteRegistry, SourceError};
use crate::tree::{HttpMethod, RouteNode};

/// Resolution state of one request.
#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: HttpMethod,
    /// Path as received, with leading slash.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub locale: String,
    pub locale_source: LocaleSource,
    /// Values extracted from the matched path.
    pub params: BoundParameters,
    route: Option<usize>,
    compiled: Arc<CompiledRoutes>,
    registry: Arc<RouteRegistry>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("locale", &self.locale)
            .field("locale_source", &self.locale_source)
            .field("route", &self.route().map(|r| r.name.as_str()))
            .field("params", &self.params)
            .finish()
    }
}

/// Fields the server fills in before handing the context to handlers.
pub struct ContextParts {
    pub request_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub locale: String,
    pub locale_source: LocaleSource,
    pub route: Option<usize>,
    pub params: BoundParameters,
}

impl RequestContext {
    pub fn new(parts: ContextParts, compiled: Arc<CompiledRoutes>, registry: Arc<RouteRegistry>) -> Self {
        Self {
            request_id: parts.request_id,
            method: parts.method,
            path: parts.path,
            query: parts.query,
            headers: parts.headers,
            locale: parts.locale,
            locale_source: parts.locale_source,
            params: parts.params,
            route: parts.route,
            compiled,
            registry,
        }
    }

    /// The matched route, if any.
    pub fn route(&self) -> Option<&RegisteredRoute> {
        self.route.and_then(|i| self.compiled.routes.get(i))
    }

    pub fn node(&self) -> Option<&RouteNode> {
        self.route().and_then(|r| self.compiled.tree.get_node(&r.node))
    }

    /// Free-form data declared on the matched node.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.node().map(|n| &n.data)
    }

    /// Matched path values merged over the route's own keys.
    pub fn route_params(&self) -> BoundParameters {
        let mut params = self
            .route()
            .and_then(|r| r.route_keys.clone())
            .unwrap_or_default();
        params.extend(self.params.clone());
        params
    }

    pub fn compiled(&self) -> &CompiledRoutes {
        &self.compiled
    }

    pub fn url_for(&self, name: &str, keys: &BoundParameters) -> Option<String> {
        self.compiled.routes.url_for(name, keys)
    }

    /// The current page in locale `to`, with translated parameter values.
    pub fn switch_locale(&self, to: &str) -> Option<String> {
        let route = self.route()?;
        self.compiled
            .routes
            .switch_locale(route, &self.route_params(), to, self.registry.sources())
    }

    /// The current page in every other configured locale that has it.
    pub fn alternates(&self) -> Vec<(String, String)> {
        self.registry
            .options()
            .locales
            .iter()
            .filter(|l| **l != self.locale)
            .filter_map(|l| self.switch_locale(l).map(|url| (l.clone(), url)))
            .collect()
    }

    /// Resource payload for a matched parameter value.
    pub fn payload(&self, parameter: &str) -> Result<Option<Value>, SourceError> {
        let Some(value) = self.route_params().get(parameter).cloned() else {
            return Ok(None);
        };
        let Some(route) = self.route() else {
            return Ok(None);
        };
        match self
            .registry
            .sources()
            .binding_for(&route.node, parameter)
            .and_then(|b| b.payload())
        {
            Some(provider) => provider.payload(&self.locale, &value),
            None => Ok(None),
        }
    }
}
