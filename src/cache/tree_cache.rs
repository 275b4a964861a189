//! Compiled route tree persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::{ExpansionOptions, RouteSet};
use crate::tree::RouteTree;

/// Bumped whenever the blob layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no cache blob present")]
    NotFound,

    #[error("cache does not match: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

impl CacheError {
    /// Errors after which the caller should fall back to a full expansion.
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheError::NotFound | CacheError::Mismatch { .. })
    }
}

/// Identity of the inputs a route set was expanded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    /// Tree fingerprint.
    pub tree: String,
    /// Locale list, locale order and action segments.
    pub options: String,
}

impl CacheKey {
    pub fn new(tree: &RouteTree, options: &ExpansionOptions) -> Result<Self, CacheError> {
        Ok(Self {
            tree: tree.fingerprint()?,
            options: options.fingerprint()?,
        })
    }
}

/// On-disk representation of a compiled tree.
#[derive(Debug, Serialize, Deserialize)]
struct CacheBlob {
    version: u32,
    key: CacheKey,
    tree: RouteTree,
    routes: RouteSet,
}

/// Invalidation hook for the transport-level route index paired with the cache.
pub trait TransportRouteCache: Send + Sync {
    fn invalidate(&self);
}

/// Serialize `tree` and the `routes` expanded from it under `key`.
pub fn save(key: &CacheKey, tree: &RouteTree, routes: &RouteSet) -> Result<Vec<u8>, CacheError> {
    let blob = CacheBlob {
        version: CACHE_FORMAT_VERSION,
        key: key.clone(),
        tree: tree.clone(),
        routes: routes.clone(),
    };
    Ok(serde_json::to_vec(&blob)?)
}

/// Restore a blob, checking only the format version.
pub fn load(blob: &[u8]) -> Result<(RouteTree, RouteSet), CacheError> {
    let blob = decode(blob)?;
    Ok((blob.tree, blob.routes))
}

/// Restore a blob produced from the same tree and options as `expected`.
pub fn load_for(blob: &[u8], expected: &CacheKey) -> Result<(RouteTree, RouteSet), CacheError> {
    let blob = decode(blob)?;
    if blob.key.tree != expected.tree {
        return Err(CacheError::Mismatch {
            expected: format!("tree {}", expected.tree),
            found: format!("tree {}", blob.key.tree),
        });
    }
    if blob.key.options != expected.options {
        return Err(CacheError::Mismatch {
            expected: format!("options {}", expected.options),
            found: format!("options {}", blob.key.options),
        });
    }
    Ok((blob.tree, blob.routes))
}

fn decode(blob: &[u8]) -> Result<CacheBlob, CacheError> {
    #[derive(Deserialize)]
    struct Header {
        version: u32,
    }

    let header: Header = serde_json::from_slice(blob)?;
    if header.version != CACHE_FORMAT_VERSION {
        return Err(CacheError::Mismatch {
            expected: format!("version {CACHE_FORMAT_VERSION}"),
            found: format!("version {}", header.version),
        });
    }
    Ok(serde_json::from_slice(blob)?)
}

/// File-backed cache, written and deleted as a unit.
#[derive(Debug, Clone)]
pub struct TreeCache {
    path: PathBuf,
}

impl TreeCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write through a temporary file so readers never see a partial blob.
    pub fn write(&self, key: &CacheKey, tree: &RouteTree, routes: &RouteSet) -> Result<(), CacheError> {
        let bytes = save(key, tree, routes)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), bytes = bytes.len(), routes = routes.len(), "Route cache written");
        Ok(())
    }

    pub fn read(&self, expected: &CacheKey) -> Result<(RouteTree, RouteSet), CacheError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheError::NotFound),
            Err(e) => return Err(e.into()),
        };
        load_for(&bytes, expected)
    }

    /// Delete the blob and invalidate the paired transport index.
    pub fn clear(&self, transport: &dyn TransportRouteCache) -> Result<(), CacheError> {
        let removed = match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        };
        // Invalidate even when the delete failed.
        transport.invalidate();
        let removed = removed?;
        tracing::info!(path = %self.path.display(), removed, "Route cache cleared");
        Ok(())
    }
}
