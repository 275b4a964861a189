use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::routing::{CompiledRoutes, ExpansionIssue, RegisteredRoute, RouteSource};
use crate::sitemap::{sitemap_entries, SitemapEntry};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub locales: Vec<String>,
    pub default_locale: String,
    pub nodes: usize,
    pub routes: Option<RouteSummary>,
    pub cache: Option<CacheStatus>,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub routes: usize,
    pub source: RouteSource,
    pub issues: Vec<ExpansionIssue>,
}

impl From<&CompiledRoutes> for RouteSummary {
    fn from(compiled: &CompiledRoutes) -> Self {
        Self {
            routes: compiled.routes.len(),
            source: compiled.source,
            issues: compiled.issues.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (status, Json(ErrorBody { error: error.to_string() })).into_response()
}

async fn compiled(state: &AppState) -> Result<Arc<CompiledRoutes>, Response> {
    state
        .registry
        .compiled()
        .await
        .map_err(|e| error_response(StatusCode::SERVICE_UNAVAILABLE, e))
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let registry = &state.registry;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        locales: state.config.locales.available.clone(),
        default_locale: state.config.locales.default.clone(),
        nodes: registry.tree().len(),
        routes: registry.current().as_deref().map(RouteSummary::from),
        cache: registry.cache().map(|c| CacheStatus {
            path: c.path().display().to_string(),
            exists: c.exists(),
        }),
    })
}

/// Every registered route with its fields.
pub async fn get_routes(State(state): State<AppState>) -> Result<Json<Vec<RegisteredRoute>>, Response> {
    let compiled = compiled(&state).await?;
    Ok(Json(compiled.routes.as_slice().to_vec()))
}

pub async fn get_sitemap(State(state): State<AppState>) -> Result<Json<Vec<SitemapEntry>>, Response> {
    let compiled = compiled(&state).await?;
    sitemap_entries(&compiled.tree, &compiled.routes, &state.config.sitemap)
        .map(Json)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e))
}

pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<serde_json::Value>, Response> {
    state
        .registry
        .clear_cache()
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

pub async fn rebuild(State(state): State<AppState>) -> Result<Json<RouteSummary>, Response> {
    let registry = state.registry.clone();
    let compiled = tokio::task::spawn_blocking(move || registry.rebuild())
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| error_response(StatusCode::UNPROCESSABLE_ENTITY, e))?;
    tracing::info!(routes = compiled.routes.len(), "Route set rebuilt via admin API");
    Ok(Json(RouteSummary::from(compiled.as_ref())))
}
