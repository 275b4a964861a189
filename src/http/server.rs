//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the site fallback handler and the admin API
//! - Wire up middleware (tracing, timeout, request ID)
//! - Resolve every request against the compiled route index
//! - Determine the request locale, redirect or 404 on a miss
//! - Persist the locale for the next request

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::SiteConfig;
use crate::http::context::{ContextParts, RequestContext};
use crate::http::dispatch::{redirect, Dispatcher};
use crate::locale::{find_redirect, locale_cookie, stored_locale, LocaleChanged, LocaleEvents, LocaleInputs, LocaleResolver};
use crate::observability::metrics;
use crate::routing::RouteRegistry;
use crate::tree::HttpMethod;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub registry: Arc<RouteRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub resolver: Arc<LocaleResolver>,
    pub events: LocaleEvents,
}

/// HTTP server for the localized site.
pub struct SiteServer {
    router: Router,
    state: AppState,
}

impl SiteServer {
    pub fn new(config: SiteConfig, registry: Arc<RouteRegistry>, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            resolver: Arc::new(LocaleResolver::from(&config.locales)),
            config: Arc::new(config),
            registry,
            dispatcher: Arc::new(dispatcher),
            events: LocaleEvents::default(),
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let mut router = Router::new();
        if state.config.admin.enabled {
            router = router.merge(admin::admin_router(state.clone()));
        }
        router.fallback(site_handler).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Locale change notifications from served requests.
    pub fn events(&self) -> &LocaleEvents {
        &self.state.events
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve one request against the compiled routes.
async fn site_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();
    let request_id = parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = parts.uri.path().to_string();
    let method_label = parts.method.to_string();

    let Some(method) = HttpMethod::from_http(&parts.method) else {
        metrics::record_request(&method_label, 405, "none", start);
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let compiled = match state.registry.compiled().await {
        Ok(compiled) => compiled,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Route set unavailable");
            metrics::record_request(&method_label, 503, "none", start);
            return (StatusCode::SERVICE_UNAVAILABLE, "Routes unavailable").into_response();
        }
    };

    let matched = compiled.index.lookup(method, &path);
    let route_name = matched
        .as_ref()
        .and_then(|m| compiled.routes.get(m.index))
        .map(|r| r.name.clone());
    let locales = state.resolver.locales();
    let stored = stored_locale(&parts.headers, &state.config.locales.cookie_name, locales);
    let accept_language = parts
        .headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let (locale, locale_source) = state.resolver.determine(LocaleInputs {
        route_name: route_name.as_deref(),
        stored: stored.as_deref(),
        accept_language,
    });

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = ?route_name,
        locale = %locale,
        locale_source = ?locale_source,
        "Resolving request"
    );

    let mut response = match matched {
        Some(matched) => {
            let ctx = RequestContext::new(
                ContextParts {
                    request_id: request_id.clone(),
                    method,
                    path: path.clone(),
                    query: parts.uri.query().map(str::to_string),
                    headers: parts.headers.clone(),
                    locale: locale.clone(),
                    locale_source,
                    route: Some(matched.index),
                    params: matched.params,
                },
                compiled.clone(),
                state.registry.clone(),
            );
            state.dispatcher.dispatch(ctx).await
        }
        None => match find_redirect(&compiled.routes, method, &path, locales, &locale) {
            Some(target) => {
                let target = match parts.uri.query() {
                    Some(query) => format!("{target}?{query}"),
                    None => target,
                };
                tracing::info!(request_id = %request_id, path = %path, target = %target, "Redirecting to localized route");
                metrics::record_redirect(&locale);
                redirect(&target, 302)
            }
            None => {
                tracing::debug!(request_id = %request_id, path = %path, "No route matched");
                metrics::record_not_found(&method_label);
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
        },
    };

    if stored.as_deref() != Some(locale.as_str()) {
        if let Some(cookie) = locale_cookie(&state.config.locales.cookie_name, &locale) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        state.events.emit(LocaleChanged {
            from: stored,
            to: locale.clone(),
        });
    }

    metrics::record_request(&method_label, response.status().as_u16(), &locale, start);
    response
}
