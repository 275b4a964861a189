//! Building a tree from persisted node/action rows.
//!
//! The relational store keeps two tables keyed by integer ids, with
//! `parent_id` referencing the node table itself. Rows may arrive in any
//! order; the loader walks from the root so parents are always created
//! before their children, and siblings keep row id order.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tree::action::{ActionKind, ActionName, RouteAction};
use crate::tree::builder::RouteTree;
use crate::tree::definition::{parse_middleware, NodeDefinition};
use crate::tree::error::TreeError;
use crate::tree::node::{NodeRef, Segment, SitemapSettings};

/// One row of the node table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub segments: Option<Segment>,
    #[serde(default = "default_true")]
    pub inherit_path: bool,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub middleware: Map<String, Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub sitemap: Option<SitemapSettings>,
    #[serde(default)]
    pub values: Option<BTreeMap<String, Vec<String>>>,
}

/// One row of the action table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRow {
    pub id: i64,
    pub node_id: i64,
    pub name: ActionName,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub value: String,
    #[serde(default)]
    pub middleware: Map<String, Value>,
    #[serde(default)]
    pub status: Option<u16>,
}

/// A dump of both tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeRows {
    pub nodes: Vec<NodeRow>,
    pub actions: Vec<ActionRow>,
}

impl TreeRows {
    pub fn load(path: &Path) -> Result<Self, TreeError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn default_true() -> bool {
    true
}

impl RouteTree {
    /// Build a tree from persisted rows.
    pub fn from_rows(rows: &TreeRows) -> Result<Self, TreeError> {
        let mut roots = rows.nodes.iter().filter(|n| n.parent_id.is_none());
        let root = roots.next().ok_or(TreeError::NoRoot)?;
        if roots.next().is_some() {
            return Err(TreeError::MultipleRoots);
        }

        let mut children: HashMap<i64, Vec<&NodeRow>> = HashMap::new();
        for row in &rows.nodes {
            if let Some(parent) = row.parent_id {
                children.entry(parent).or_default().push(row);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|r| r.id);
        }

        let mut actions: HashMap<i64, Vec<&ActionRow>> = HashMap::new();
        for action in &rows.actions {
            actions.entry(action.node_id).or_default().push(action);
        }
        for list in actions.values_mut() {
            list.sort_by_key(|a| a.id);
        }

        let mut tree = RouteTree::new();
        let mut placed: HashMap<i64, NodeRef> = HashMap::new();
        let mut queue = vec![(root, NodeRef::ROOT)];
        placed.insert(root.id, NodeRef::ROOT);

        while let Some((row, node)) = queue.pop() {
            tree.apply(node, row_definition(row))?;
            let node_id = tree.node(node).id.clone();
            for action_row in actions.get(&row.id).into_iter().flatten() {
                let mut action = RouteAction::new(action_row.name, action_row.kind, &action_row.value);
                action.middleware = parse_middleware(&node_id, &action_row.middleware)?;
                action.redirect_status = action_row.status;
                tree.put_action(node, action);
            }

            let mut next = Vec::new();
            for child in children.get(&row.id).into_iter().flatten() {
                let child_ref = tree.insert_child(node, &child.name)?;
                placed.insert(child.id, child_ref);
                next.push((*child, child_ref));
            }
            // LIFO queue: push in reverse so siblings are applied in id order.
            queue.extend(next.into_iter().rev());
        }

        if let Some(orphan) = rows.nodes.iter().find(|n| !placed.contains_key(&n.id)) {
            return Err(TreeError::OrphanRow(orphan.id));
        }
        if let Some(action) = rows.actions.iter().find(|a| !placed.contains_key(&a.node_id)) {
            return Err(TreeError::UnknownRowNode {
                action: action.id,
                node: action.node_id,
            });
        }
        Ok(tree)
    }

    fn put_action(&mut self, node: NodeRef, action: RouteAction) {
        self.node_mut(node).put_action(action);
    }
}

fn row_definition(row: &NodeRow) -> NodeDefinition {
    NodeDefinition {
        segment: row.segments.clone(),
        namespace: row.namespace.clone(),
        inherit_path: Some(row.inherit_path),
        middleware: row.middleware.clone(),
        data: row.data.clone(),
        sitemap: row.sitemap.clone(),
        values: row.values.clone(),
        children: Map::new(),
        actions: Map::new(),
    }
}
