//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the route tree from the configured source
//! - Bind static parameter values declared in the tree
//! - Assemble the route registry with its cache
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The route set is built before the listener accepts traffic

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::TreeCache;
use crate::config::{ConfigError, SiteConfig};
use crate::routing::{BuildError, CompiledRoutes, ExpansionOptions, ParameterSources, RouteRegistry};
use crate::tree::{load_definition, RouteTree, TreeError, TreeRows};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("route tree: {0}")]
    Tree(#[from] TreeError),

    #[error("route build: {0}")]
    Build(#[from] BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the route tree from whichever source the config names.
pub fn load_tree(config: &SiteConfig) -> Result<RouteTree, TreeError> {
    let tree = match (&config.tree.definition, &config.tree.rows) {
        (Some(definition), _) => {
            let definition = load_definition(Path::new(definition))?;
            RouteTree::from_definition(definition)?
        }
        (None, Some(rows)) => RouteTree::from_rows(&TreeRows::load(Path::new(rows))?)?,
        (None, None) => RouteTree::new(),
    };
    tracing::info!(nodes = tree.len(), "Route tree loaded");
    Ok(tree)
}

/// Registry over `tree`, using the configured locales and cache.
pub fn build_registry(config: &SiteConfig, tree: RouteTree, sources: ParameterSources) -> RouteRegistry {
    let registry = RouteRegistry::new(tree, sources, ExpansionOptions::from(&config.locales));
    if config.cache.enabled {
        registry.with_cache(TreeCache::new(&config.cache.path))
    } else {
        registry
    }
}

/// Compile the route set on the blocking pool and log its warnings.
pub async fn warm_up(registry: &Arc<RouteRegistry>) -> Result<Arc<CompiledRoutes>, BuildError> {
    let compiled = registry.compiled().await?;
    for issue in &compiled.issues {
        tracing::warn!(issue = %issue, "Route expansion warning");
    }
    tracing::info!(
        routes = compiled.routes.len(),
        source = ?compiled.source,
        warnings = compiled.issues.len(),
        "Route set ready"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_tree_from_definition_file() {
        let path = std::env::temp_dir().join(format!("route-tree-startup-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [get]
            view = "home"

            [children.about]
            segment = { de = "ueber", en = "about" }
            get = { view = "about" }
            "#,
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.tree.definition = Some(path.display().to_string());
        let tree = load_tree(&config).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(tree.len(), 2);
        assert!(tree.get_node("about").is_some());
    }

    #[test]
    fn test_registry_uses_cache_when_enabled() {
        let mut config = SiteConfig::default();
        config.cache.enabled = true;
        config.cache.path = "target/test-cache.json".into();
        let registry = build_registry(&config, RouteTree::new(), ParameterSources::new());
        assert_eq!(registry.cache().map(|c| c.path().to_path_buf()), Some(std::path::PathBuf::from("target/test-cache.json")));
    }
}
