//! Tree construction errors.

use thiserror::Error;

/// Errors raised while building a route tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported tree file '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("invalid node name '{0}'")]
    InvalidName(String),

    #[error("node '{node}': unknown key '{key}'")]
    UnknownKey { node: String, key: String },

    #[error("node '{node}': invalid action '{action}': {reason}")]
    InvalidAction {
        node: String,
        action: String,
        reason: String,
    },

    #[error("node '{node}': invalid middleware '{middleware}': {reason}")]
    InvalidMiddleware {
        node: String,
        middleware: String,
        reason: String,
    },

    #[error("node '{node}': segments declare different parameters")]
    ParameterMismatch { node: String },

    #[error("node '{0}' not found")]
    UnknownNode(String),

    #[error("row set has no root node")]
    NoRoot,

    #[error("row set has more than one root node")]
    MultipleRoots,

    #[error("node row {0} is not reachable from the root")]
    OrphanRow(i64),

    #[error("action row {action} references unknown node row {node}")]
    UnknownRowNode { action: i64, node: i64 },
}
