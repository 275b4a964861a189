//! Admin API for inspecting and maintaining the compiled routes.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/sitemap", get(get_sitemap))
        .route("/admin/cache/clear", post(clear_cache))
        .route("/admin/cache/rebuild", post(rebuild))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
