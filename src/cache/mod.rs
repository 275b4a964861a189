//! Compiled tree cache subsystem.
//!
//! # Data Flow
//! ```text
//! RouteTree + RouteSet
//!     → save (versioned JSON blob keyed by tree + options fingerprints)
//!     → TreeCache::write (temp file + rename)
//!
//! Startup / rebuild:
//!     TreeCache::read(CacheKey of current tree and options)
//!     → version, tree and options fingerprints checked
//!     → Mismatch / NotFound → caller re-expands
//! ```
//!
//! # Design Decisions
//! - No TTL: the blob is valid until the tree or the locale options change, or it is cleared
//! - Clearing also invalidates the in-memory route index

pub mod tree_cache;

pub use tree_cache::{load, load_for, save, CacheError, CacheKey, TransportRouteCache, TreeCache, CACHE_FORMAT_VERSION};
