//! Compiled route registry.
//!
//! # Responsibilities
//! - Build the route set once, from the cache when valid, else by expansion
//! - Publish the compiled set atomically for lock-free readers
//! - Drop the in-memory set when the cache is cleared
//!
//! # Design Decisions
//! - Building is serialized by a mutex; the first caller builds, later callers reuse
//! - Expansion may block on parameter providers, so async callers go through `spawn_blocking`
//! - Cache write failures are logged, never fatal

use std::sync::{Arc, Mutex};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use thiserror::Error;

use crate::cache::{CacheError, CacheKey, TransportRouteCache, TreeCache};
use crate::observability::metrics;
use crate::routing::engine::{expand, ExpansionError, ExpansionIssue, ExpansionOptions};
use crate::routing::index::RouteIndex;
use crate::routing::params::ParameterSources;
use crate::routing::set::RouteSet;
use crate::tree::RouteTree;

/// Where the active route set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Expanded,
    Cache,
}

/// An immutable, fully indexed route set.
#[derive(Debug)]
pub struct CompiledRoutes {
    pub tree: RouteTree,
    pub routes: RouteSet,
    pub index: RouteIndex,
    /// Warnings from the expansion pass; empty when loaded from cache.
    pub issues: Vec<ExpansionIssue>,
    pub source: RouteSource,
}

impl CompiledRoutes {
    pub fn new(tree: RouteTree, routes: RouteSet, issues: Vec<ExpansionIssue>, source: RouteSource) -> Self {
        let index = RouteIndex::build(&routes);
        Self {
            tree,
            routes,
            index,
            issues,
            source,
        }
    }
}

/// Errors raised while building the route set.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("route build task failed: {0}")]
    Task(String),
}

/// Owns the tree, its parameter sources and the active compiled set.
pub struct RouteRegistry {
    tree: RouteTree,
    sources: ParameterSources,
    options: ExpansionOptions,
    cache: Option<TreeCache>,
    current: ArcSwapOption<CompiledRoutes>,
    build_lock: Mutex<()>,
}

impl RouteRegistry {
    pub fn new(tree: RouteTree, sources: ParameterSources, options: ExpansionOptions) -> Self {
        Self {
            tree,
            sources,
            options,
            cache: None,
            current: ArcSwapOption::empty(),
            build_lock: Mutex::new(()),
        }
    }

    pub fn with_cache(mut self, cache: TreeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    pub fn sources(&self) -> &ParameterSources {
        &self.sources
    }

    pub fn options(&self) -> &ExpansionOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&TreeCache> {
        self.cache.as_ref()
    }

    /// The active set, if one has been built.
    pub fn current(&self) -> Option<Arc<CompiledRoutes>> {
        self.current.load_full()
    }

    /// Return the active set, building it first if needed. Blocking.
    pub fn get_or_build(&self) -> Result<Arc<CompiledRoutes>, BuildError> {
        if let Some(compiled) = self.current.load_full() {
            return Ok(compiled);
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(compiled) = self.current.load_full() {
            return Ok(compiled);
        }

        let compiled = Arc::new(self.build()?);
        self.current.store(Some(compiled.clone()));
        Ok(compiled)
    }

    /// Async entry point; runs the build on the blocking pool.
    pub async fn compiled(self: &Arc<Self>) -> Result<Arc<CompiledRoutes>, BuildError> {
        if let Some(compiled) = self.current.load_full() {
            return Ok(compiled);
        }
        let registry = Arc::clone(self);
        tokio::task::spawn_blocking(move || registry.get_or_build())
            .await
            .map_err(|e| BuildError::Task(e.to_string()))?
    }

    /// Delete the cache blob (if any) and drop the active set.
    pub fn clear_cache(&self) -> Result<(), CacheError> {
        match &self.cache {
            Some(cache) => cache.clear(self)?,
            None => self.invalidate(),
        }
        metrics::record_cache_event("clear");
        Ok(())
    }

    /// Clear, then build again by full expansion.
    pub fn rebuild(&self) -> Result<Arc<CompiledRoutes>, BuildError> {
        self.clear_cache()?;
        self.get_or_build()
    }

    fn build(&self) -> Result<CompiledRoutes, BuildError> {
        let key = match &self.cache {
            Some(_) => Some(CacheKey::new(&self.tree, &self.options)?),
            None => None,
        };
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            match cache.read(key) {
                Ok((tree, routes)) => {
                    metrics::record_cache_event("hit");
                    metrics::record_registered_routes(routes.len());
                    tracing::info!(path = %cache.path().display(), routes = routes.len(), "Route set loaded from cache");
                    return Ok(CompiledRoutes::new(tree, routes, Vec::new(), RouteSource::Cache));
                }
                Err(e) if e.is_stale() => {
                    metrics::record_cache_event("miss");
                    tracing::info!(path = %cache.path().display(), reason = %e, "Route cache unusable, expanding");
                }
                Err(e) => {
                    metrics::record_cache_event("error");
                    tracing::warn!(path = %cache.path().display(), error = %e, "Route cache unreadable, expanding");
                }
            }
        }

        let start = Instant::now();
        let expansion = expand(&self.tree, &self.sources, &self.options)?;
        let routes = RouteSet::new(expansion.routes);
        metrics::record_expansion(start, routes.len());
        tracing::info!(
            routes = routes.len(),
            warnings = expansion.issues.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Route tree expanded"
        );

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            match cache.write(key, &self.tree, &routes) {
                Ok(()) => metrics::record_cache_event("write"),
                Err(e) => tracing::warn!(path = %cache.path().display(), error = %e, "Failed to write route cache"),
            }
        }

        Ok(CompiledRoutes::new(
            self.tree.clone(),
            routes,
            expansion.issues,
            RouteSource::Expanded,
        ))
    }
}

impl TransportRouteCache for RouteRegistry {
    fn invalidate(&self) {
        self.current.store(None);
        tracing::debug!("Active route set invalidated");
    }
}
