//! Localized route tree: compiles a hierarchical, multi-language site
//! definition into flat locale-aware routes and serves them.

pub mod admin;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod locale;
pub mod observability;
pub mod routing;
pub mod sitemap;
pub mod tree;

pub use config::SiteConfig;
pub use http::SiteServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteRegistry, RouteSet};
pub use tree::RouteTree;
