//! Route node tree subsystem.
//!
//! # Data Flow
//! ```text
//! Declarative definition (TOML/JSON)      Persisted rows (node + action tables)
//!     → definition.rs (parse)                 → rows.rs (parent-before-child walk)
//!     → builder.rs (RouteTree arena) ←────────┘
//!     → frozen and handed to the expansion engine
//! ```
//!
//! # Design Decisions
//! - Nodes live in an arena; parents are indices fixed at insertion
//! - Node ids are dot-paths computed from the ancestor chain
//! - Children and actions keep declaration order

pub mod action;
pub mod builder;
pub mod definition;
pub mod error;
pub mod node;
pub mod rows;

pub use action::{ActionKind, ActionName, HttpMethod, RouteAction};
pub use builder::RouteTree;
pub use definition::{load_definition, NodeDefinition};
pub use error::TreeError;
pub use node::{ChangeFreq, MiddlewareEntry, NodeRef, RouteNode, Segment, SitemapSettings};
pub use rows::{ActionRow, NodeRow, TreeRows};
