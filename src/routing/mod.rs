//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup or after a cache clear):
//!     RouteTree + ParameterSources
//!     → segment.rs (per-locale paths, inheritPath restarts)
//!     → middleware.rs (inherited middleware with skips)
//!     → engine.rs (node × locale × action × parameter values)
//!     → set.rs (ordered RouteSet, url_for, switch_locale)
//!     → index.rs (matchit routers per method)
//!     → registry.rs (cache-or-expand, atomic publish)
//!
//! Incoming Request:
//!     method + path → RouteIndex::lookup → RegisteredRoute + params
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - Deterministic: same tree and sources always yield the same list
//! - List order is load-bearing (redirect search, sitemap dedup)

pub mod engine;
pub mod index;
pub mod middleware;
pub mod params;
pub mod registry;
pub mod route;
pub mod segment;
pub mod set;

pub use engine::{expand, Expansion, ExpansionError, ExpansionIssue, ExpansionOptions};
pub use index::{RouteIndex, RouteMatch};
pub use middleware::{resolve_middleware, ResolvedMiddleware};
pub use params::{
    BoundParameters, ParameterBinding, ParameterSources, ParameterValues, ProvidesPayload, ProvidesTranslation,
    ProvidesValues, SourceError, StaticValues,
};
pub use registry::{BuildError, CompiledRoutes, RouteRegistry, RouteSource};
pub use route::{route_name, DispatchTarget, RegisteredRoute};
pub use segment::{resolve_path, resolve_segment, MissingSegment};
pub use set::RouteSet;
