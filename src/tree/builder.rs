//! The route node tree.
//!
//! # Responsibilities
//! - Own every node in an arena, root at index 0
//! - Apply declarative definitions (set root, merge subtrees)
//! - Look nodes up by dot-path id
//!
//! # Design Decisions
//! - Builder only ever appends nodes; a node's parent is fixed at insertion,
//!   so cycles cannot be constructed
//! - Children keep insertion order, which drives expansion order

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::tree::definition::NodeDefinition;
use crate::tree::error::TreeError;
use crate::tree::node::{placeholders, NodeRef, RouteNode, Segment};

/// The in-memory site hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    /// A tree holding only an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![RouteNode::new(String::new(), String::new(), None)],
        }
    }

    /// Build a tree from a root definition.
    pub fn from_definition(definition: NodeDefinition) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        tree.set_root_node(definition)?;
        Ok(tree)
    }

    /// Replace the whole tree with `definition` as its root.
    pub fn set_root_node(&mut self, definition: NodeDefinition) -> Result<(), TreeError> {
        let mut fresh = Self::new();
        fresh.apply(NodeRef::ROOT, definition)?;
        *self = fresh;
        Ok(())
    }

    /// Merge `children` under the node `parent_id`.
    ///
    /// Existing children with the same name are merged recursively; new ones
    /// are appended after the current children.
    pub fn add_nodes(
        &mut self,
        parent_id: &str,
        children: Vec<(String, NodeDefinition)>,
    ) -> Result<(), TreeError> {
        let parent = self
            .lookup(parent_id)
            .ok_or_else(|| TreeError::UnknownNode(parent_id.to_string()))?;
        for (name, definition) in children {
            let child = self.child_or_insert(parent, &name)?;
            self.apply(child, definition)?;
        }
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Option<&RouteNode> {
        self.lookup(id).map(|r| self.node(r))
    }

    pub fn root(&self) -> &RouteNode {
        &self.nodes[0]
    }

    pub fn node(&self, node: NodeRef) -> &RouteNode {
        &self.nodes[node.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.root().actions.is_empty()
    }

    pub fn parent(&self, node: &RouteNode) -> Option<&RouteNode> {
        node.parent.map(|p| self.node(p))
    }

    pub fn children<'a>(&'a self, node: &'a RouteNode) -> impl Iterator<Item = &'a RouteNode> + 'a {
        node.children.iter().map(move |c| self.node(*c))
    }

    /// Ancestors of `node`, root first, excluding `node` itself.
    pub fn ancestors<'a>(&'a self, node: &'a RouteNode) -> Vec<&'a RouteNode> {
        let mut chain = Vec::new();
        let mut current = self.parent(node);
        while let Some(n) = current {
            chain.push(n);
            current = self.parent(n);
        }
        chain.reverse();
        chain
    }

    /// Depth-first pre-order walk, children in insertion order.
    pub fn walk(&self) -> Vec<&RouteNode> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeRef::ROOT];
        while let Some(current) = stack.pop() {
            let node = self.node(current);
            order.push(node);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Namespace of the node or its nearest ancestor declaring one.
    pub fn effective_namespace<'a>(&'a self, node: &'a RouteNode) -> Option<&'a str> {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(ns) = n.namespace.as_deref() {
                return Some(ns);
            }
            current = self.parent(n);
        }
        None
    }

    /// SHA-256 over the canonical JSON form of the tree.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn lookup(&self, id: &str) -> Option<NodeRef> {
        self.nodes.iter().position(|n| n.id == id).map(NodeRef)
    }

    fn child_or_insert(&mut self, parent: NodeRef, name: &str) -> Result<NodeRef, TreeError> {
        if name.is_empty() || name.contains('.') || name.contains('/') {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        let existing = self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name);
        if let Some(child) = existing {
            return Ok(child);
        }

        let parent_id = &self.nodes[parent.0].id;
        let id = if parent_id.is_empty() {
            name.to_string()
        } else {
            format!("{parent_id}.{name}")
        };
        let child = NodeRef(self.nodes.len());
        self.nodes.push(RouteNode::new(id, name.to_string(), Some(parent)));
        self.nodes[parent.0].children.push(child);
        Ok(child)
    }

    pub(crate) fn apply(&mut self, target: NodeRef, definition: NodeDefinition) -> Result<(), TreeError> {
        let id = self.nodes[target.0].id.clone();
        let actions = definition.parse_actions(&id)?;
        let middleware = definition.parse_middleware(&id)?;
        let children = definition.parse_children()?;

        {
            let node = &mut self.nodes[target.0];
            if let Some(segment) = definition.segment {
                node.parameter = parameter_of(&id, &segment)?;
                node.segment = segment;
            }
            if let Some(namespace) = definition.namespace {
                node.namespace = Some(namespace);
            }
            if let Some(inherit_path) = definition.inherit_path {
                node.inherit_path = inherit_path;
            }
            if let Some(sitemap) = definition.sitemap {
                node.sitemap = sitemap;
            }
            if let Some(values) = definition.values {
                node.values = Some(values);
            }
            node.data.extend(definition.data);
            for (name, entry) in middleware {
                node.put_middleware(name, entry);
            }
            for action in actions {
                node.put_action(action);
            }
        }

        for (name, child_definition) in children {
            let child = self.child_or_insert(target, &name)?;
            self.apply(child, child_definition)?;
        }
        Ok(())
    }

    pub(crate) fn insert_child(&mut self, parent: NodeRef, name: &str) -> Result<NodeRef, TreeError> {
        self.child_or_insert(parent, name)
    }

    pub(crate) fn node_mut(&mut self, node: NodeRef) -> &mut RouteNode {
        &mut self.nodes[node.0]
    }
}

/// Parameter declared by a segment; all locales must agree.
fn parameter_of(node: &str, segment: &Segment) -> Result<Option<String>, TreeError> {
    let mut found: Option<&str> = None;
    for variant in segment.variants() {
        let names = placeholders(variant);
        if names.len() > 1 {
            return Err(TreeError::ParameterMismatch { node: node.to_string() });
        }
        match (found, names.first()) {
            (None, Some(name)) => found = Some(*name),
            (Some(prev), Some(name)) if prev != *name => {
                return Err(TreeError::ParameterMismatch { node: node.to_string() })
            }
            (Some(_), None) => {
                return Err(TreeError::ParameterMismatch { node: node.to_string() })
            }
            _ => {}
        }
    }
    Ok(found.map(str::to_string))
}
