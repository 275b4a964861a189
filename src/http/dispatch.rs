//! Dispatch of matched routes to application handlers.
//!
//! # Responsibilities
//! - Hold the controller, closure and guard registries
//! - Run route middleware as guards in resolved order
//! - Invoke the handler the route's target names, or issue its redirect
//!
//! # Design Decisions
//! - Handlers are registered by the names used in the tree (`uses`, `closure`)
//! - A middleware with no registered guard is a no-op, logged at debug
//! - A missing handler is a server error, never a panic

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;
use crate::routing::route::fill_placeholders;
use crate::routing::{DispatchTarget, RegisteredRoute};

/// Application handler for a controller reference or closure name.
pub type Handler = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Request-time check backing a named route middleware.
pub trait RouteGuard: Send + Sync {
    /// `Err` short-circuits the request with the given response.
    fn check(&self, ctx: &RequestContext, parameters: &[String]) -> Result<(), Response>;
}

/// Renders `view` targets.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, ctx: &RequestContext) -> Response;
}

/// Default renderer: a JSON description of the view and its route.
#[derive(Debug, Default)]
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn render(&self, view: &str, ctx: &RequestContext) -> Response {
        let body = serde_json::json!({
            "view": view,
            "locale": ctx.locale,
            "route": ctx.route().map(|r| r.name.as_str()),
            "params": ctx.route_params(),
            "data": ctx.data(),
            "alternates": ctx
                .alternates()
                .into_iter()
                .map(|(locale, url)| (locale, serde_json::Value::String(url)))
                .collect::<serde_json::Map<_, _>>(),
        });
        Json(body).into_response()
    }
}

/// Registry of everything a route target can point at.
pub struct Dispatcher {
    controllers: HashMap<String, Handler>,
    closures: HashMap<String, Handler>,
    guards: HashMap<String, Arc<dyn RouteGuard>>,
    views: Arc<dyn ViewRenderer>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
            closures: HashMap::new(),
            guards: HashMap::new(),
            views: Arc::new(JsonViewRenderer),
        }
    }

    /// Register a controller under its fully qualified reference (`ns::Controller@method`).
    pub fn controller(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.controllers.insert(name.into(), handler);
        self
    }

    pub fn closure(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.closures.insert(name.into(), handler);
        self
    }

    pub fn guard(mut self, middleware: impl Into<String>, guard: Arc<dyn RouteGuard>) -> Self {
        self.guards.insert(middleware.into(), guard);
        self
    }

    pub fn views(mut self, renderer: Arc<dyn ViewRenderer>) -> Self {
        self.views = renderer;
        self
    }

    /// Run the route's middleware guards in order.
    pub fn check_guards(&self, ctx: &RequestContext, route: &RegisteredRoute) -> Result<(), Response> {
        for middleware in &route.middleware {
            match self.guards.get(&middleware.name) {
                Some(guard) => guard.check(ctx, &middleware.parameters)?,
                None => tracing::debug!(
                    request_id = %ctx.request_id,
                    middleware = %middleware.name,
                    "No guard registered for middleware"
                ),
            }
        }
        Ok(())
    }

    /// Produce the response for a matched request.
    pub async fn dispatch(&self, ctx: RequestContext) -> Response {
        let Some(route) = ctx.route().cloned() else {
            return StatusCode::NOT_FOUND.into_response();
        };
        if let Err(response) = self.check_guards(&ctx, &route) {
            tracing::debug!(request_id = %ctx.request_id, route = %route.name, "Request rejected by route guard");
            return response;
        }

        match &route.target {
            DispatchTarget::Uses { controller } => self.call(&self.controllers, controller, ctx).await,
            DispatchTarget::Closure { closure } => self.call(&self.closures, closure, ctx).await,
            DispatchTarget::View { view } => self.views.render(view, &ctx),
            DispatchTarget::Redirect { to, status } => {
                let location = fill_placeholders(to, &ctx.route_params());
                redirect(&location, *status)
            }
        }
    }

    async fn call(&self, registry: &HashMap<String, Handler>, name: &str, ctx: RequestContext) -> Response {
        match registry.get(name) {
            Some(handler) => handler(ctx).await,
            None => {
                tracing::error!(request_id = %ctx.request_id, handler = %name, "No handler registered");
                (StatusCode::INTERNAL_SERVER_ERROR, "Handler not registered").into_response()
            }
        }
    }
}

/// Redirect response; invalid statuses fall back to 302.
pub fn redirect(location: &str, status: u16) -> Response {
    let status = StatusCode::from_u16(status)
        .ok()
        .filter(StatusCode::is_redirection)
        .unwrap_or(StatusCode::FOUND);
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
