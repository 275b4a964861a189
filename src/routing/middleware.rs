//! Middleware inheritance.
//!
//! # Responsibilities
//! - Collect inheritable ancestor middleware, root first
//! - Append the node's own and the action's middleware
//! - Apply skip entries and later-wins overrides
//!
//! # Design Decisions
//! - A skip entry removes earlier entries of its name and is never emitted
//! - Redeclaring a name moves it to the later position with the later parameters

use serde::{Deserialize, Serialize};

use crate::tree::{MiddlewareEntry, RouteAction, RouteNode, RouteTree};

/// A middleware applied to a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMiddleware {
    pub name: String,
    pub parameters: Vec<String>,
}

/// Effective middleware list for `action` on `node`.
pub fn resolve_middleware(
    tree: &RouteTree,
    node: &RouteNode,
    action: Option<&RouteAction>,
) -> Vec<ResolvedMiddleware> {
    let mut resolved = Vec::new();

    for ancestor in tree.ancestors(node) {
        for (name, entry) in &ancestor.middleware {
            if entry.inherit {
                merge(&mut resolved, name, entry);
            }
        }
    }
    for (name, entry) in &node.middleware {
        merge(&mut resolved, name, entry);
    }
    if let Some(action) = action {
        for (name, entry) in &action.middleware {
            merge(&mut resolved, name, entry);
        }
    }
    resolved
}

fn merge(resolved: &mut Vec<ResolvedMiddleware>, name: &str, entry: &MiddlewareEntry) {
    resolved.retain(|m| m.name != name);
    if !entry.skip {
        resolved.push(ResolvedMiddleware {
            name: name.to_string(),
            parameters: entry.parameters.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ActionName, NodeDefinition};
    use serde_json::json;

    fn tree() -> RouteTree {
        RouteTree::from_definition(
            NodeDefinition::from_value(json!({
                "middleware": { "web": true, "locale": { "inherit": false } },
                "children": {
                    "account": {
                        "middleware": { "auth": ["user"] },
                        "get": { "view": "account" },
                        "children": {
                            "login": {
                                "middleware": { "auth": false, "guest": true },
                                "get": { "view": "login" },
                                "post": { "uses": "LoginController@store", "middleware": { "throttle": ["5"], "web": false } },
                            },
                            "settings": {
                                "get": { "view": "settings", "middleware": { "auth": ["admin"] } },
                            }
                        }
                    }
                }
            }))
            .unwrap(),
        )
        .unwrap()
    }

    fn names(list: &[ResolvedMiddleware]) -> Vec<&str> {
        list.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_root_to_leaf_order() {
        let tree = tree();
        let account = tree.get_node("account").unwrap();
        let resolved = resolve_middleware(&tree, account, account.action(ActionName::Get));
        assert_eq!(names(&resolved), vec!["web", "auth"]);
        assert_eq!(resolved[1].parameters, vec!["user"]);
    }

    #[test]
    fn test_non_inheritable_entry_stays_on_its_node() {
        let tree = tree();
        let root = tree.root();
        assert_eq!(names(&resolve_middleware(&tree, root, None)), vec!["web", "locale"]);
    }

    #[test]
    fn test_skip_removes_inherited_entry() {
        let tree = tree();
        let login = tree.get_node("account.login").unwrap();
        let get = resolve_middleware(&tree, login, login.action(ActionName::Get));
        assert_eq!(names(&get), vec!["web", "guest"]);

        let post = resolve_middleware(&tree, login, login.action(ActionName::Post));
        assert_eq!(names(&post), vec!["guest", "throttle"]);
        assert!(!post.iter().any(|m| m.name == "auth" || m.name == "web"));
    }

    #[test]
    fn test_action_overrides_parameters() {
        let tree = tree();
        let settings = tree.get_node("account.settings").unwrap();
        let resolved = resolve_middleware(&tree, settings, settings.action(ActionName::Get));
        assert_eq!(names(&resolved), vec!["web", "auth"]);
        assert_eq!(resolved[1].parameters, vec!["admin"]);
    }
}
