//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace and timeout layers)
//!     → RouteIndex lookup on the compiled routes
//!     → context.rs (request-scoped route + locale)
//!     → dispatch.rs (guards, then controller / closure / view / redirect)
//!     → [miss] locale redirect or 404
//!     → Set-Cookie with the resolved locale
//! ```

pub mod context;
pub mod dispatch;
pub mod server;

pub use context::{ContextParts, RequestContext};
pub use dispatch::{handler, Dispatcher, Handler, JsonViewRenderer, RouteGuard, ViewRenderer};
pub use server::{AppState, SiteServer};
