//! Per-locale segment and path resolution.

use crate::tree::{RouteNode, RouteTree, Segment};

/// The node whose segment is missing for the requested locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSegment {
    pub node: String,
}

/// Segment `node` contributes in `locale`, if it has one.
pub fn resolve_segment<'a>(node: &'a RouteNode, locale: &str) -> Option<&'a str> {
    match &node.segment {
        Segment::Uniform(segment) => Some(segment),
        Segment::PerLocale(map) => map.get(locale).map(String::as_str),
    }
}

/// Full locale-prefixed path of `node`, without leading slash.
///
/// Ancestor segments are prepended up to the first node (walking upwards)
/// with `inherit_path == false`, which restarts the path at itself.
pub fn resolve_path(tree: &RouteTree, node: &RouteNode, locale: &str) -> Result<String, MissingSegment> {
    let mut chain = vec![node];
    let mut current = node;
    while current.inherit_path {
        match tree.parent(current) {
            Some(parent) => {
                chain.push(parent);
                current = parent;
            }
            None => break,
        }
    }

    let mut path = locale.to_string();
    for n in chain.iter().rev() {
        let segment = resolve_segment(n, locale).ok_or_else(|| MissingSegment { node: n.id.clone() })?;
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            path.push('/');
            path.push_str(segment);
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeDefinition;
    use serde_json::json;

    fn tree() -> RouteTree {
        RouteTree::from_definition(
            NodeDefinition::from_value(json!({
                "children": {
                    "company": {
                        "segment": { "de": "firma", "en": "company" },
                        "children": {
                            "team": { "segment": { "de": "team" } },
                            "imprint": { "inherit_path": false, "segment": { "de": "impressum", "en": "imprint" } },
                        }
                    }
                }
            }))
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_path_concatenates_parent_path() {
        let tree = tree();
        let company = tree.get_node("company").unwrap();
        assert_eq!(resolve_path(&tree, tree.root(), "de").unwrap(), "de");
        assert_eq!(resolve_path(&tree, company, "de").unwrap(), "de/firma");
        assert_eq!(resolve_path(&tree, company, "en").unwrap(), "en/company");
    }

    #[test]
    fn test_inherit_path_false_restarts() {
        let tree = tree();
        let imprint = tree.get_node("company.imprint").unwrap();
        assert_eq!(resolve_path(&tree, imprint, "de").unwrap(), "de/impressum");
    }

    #[test]
    fn test_missing_locale_reports_origin() {
        let tree = tree();
        let team = tree.get_node("company.team").unwrap();
        assert_eq!(resolve_segment(team, "en"), None);
        assert_eq!(
            resolve_path(&tree, team, "en").unwrap_err(),
            MissingSegment { node: "company.team".into() }
        );
    }

    #[test]
    fn test_default_segment_is_node_name() {
        let tree = RouteTree::from_definition(
            NodeDefinition::from_value(json!({ "children": { "contact": {} } })).unwrap(),
        )
        .unwrap();
        let contact = tree.get_node("contact").unwrap();
        assert_eq!(resolve_path(&tree, contact, "en").unwrap(), "en/contact");
    }
}
