//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use route_tree::config::SiteConfig;
use route_tree::http::{handler, Dispatcher, RequestContext, RouteGuard, SiteServer};
use route_tree::lifecycle::build_registry;
use route_tree::routing::ParameterSources;
use route_tree::tree::{NodeDefinition, RouteTree};

pub const ADMIN_KEY: &str = "test-admin-key";

/// A two-locale site exercising every tree feature the server relies on.
pub fn site_definition() -> Value {
    json!({
        "middleware": { "web": true },
        "get": { "view": "home" },
        "children": {
            "target": { "get": { "view": "target" } },
            "flowers": {
                "segment": { "de": "blumen", "en": "flowers" },
                "index": { "view": "flowers" },
                "children": {
                    "flower": {
                        "segment": "{flower}",
                        "values": { "de": ["rose", "tulpe"], "en": ["rose-en", "tulip"] },
                        "show": { "view": "flower" },
                    }
                }
            },
            "products": {
                "segment": { "de": "produkte", "en": "products" },
                "namespace": "shop",
                "index": "ProductController@index",
                "create": "ProductController@create",
                "store": "ProductController@store",
            },
            "account": {
                "middleware": { "auth": ["user"] },
                "get": { "view": "account" },
            },
            "contact": {
                "segment": { "de": "kontakt", "en": "contact" },
                "get": { "view": "contact" },
                "post": { "closure": "send_contact" },
            },
            "legacy": { "get": { "redirect": "contact", "status": 301 } },
            "company": {
                "segment": { "de": "firma", "en": "company" },
                "children": {
                    "imprint": {
                        "inheritPath": false,
                        "segment": { "de": "impressum", "en": "imprint" },
                        "get": { "view": "imprint" },
                    }
                }
            },
            "drafts": { "sitemap": { "excluded": true }, "get": { "view": "drafts" } },
        }
    })
}

pub fn site_tree() -> RouteTree {
    RouteTree::from_definition(NodeDefinition::from_value(site_definition()).unwrap()).unwrap()
}

pub fn site_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.locales.available = vec!["de".into(), "en".into()];
    config.locales.default = "de".into();
    config.sitemap.base_url = "https://example.org".into();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config
}

/// Rejects requests without an `x-user` header.
pub struct HeaderAuth;

impl RouteGuard for HeaderAuth {
    fn check(&self, ctx: &RequestContext, _parameters: &[String]) -> Result<(), Response> {
        if ctx.headers.contains_key("x-user") {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED.into_response())
        }
    }
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::new()
        .controller(
            "shop::ProductController@index",
            handler(|ctx: RequestContext| async move { format!("products:{}", ctx.locale).into_response() }),
        )
        .closure(
            "send_contact",
            handler(|_ctx: RequestContext| async move { (StatusCode::CREATED, "sent").into_response() }),
        )
        .guard("auth", Arc::new(HeaderAuth))
}

pub fn site_server(config: SiteConfig) -> SiteServer {
    let tree = site_tree();
    let sources = ParameterSources::from_tree(&tree);
    let registry = Arc::new(build_registry(&config, tree, sources));
    SiteServer::new(config, registry, dispatcher())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with(uri: &str, header: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header, value)
        .body(Body::empty())
        .unwrap()
}

pub fn admin(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {ADMIN_KEY}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(server: &SiteServer, request: Request<Body>) -> Response {
    server.router().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> Option<&str> {
    response.headers().get("location").and_then(|v| v.to_str().ok())
}

pub fn temp_cache_path() -> PathBuf {
    std::env::temp_dir().join(format!("route-tree-it-{}.json", uuid::Uuid::new_v4()))
}
