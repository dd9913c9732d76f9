//! Per-file assignment data-flow table.
//!
//! Not an [`Analyzer`](crate::analyzer::Analyzer): the result is a side
//! table keyed by file rather than a repository fact. For every plain
//! assignment to a single name, the names read on the right-hand side are
//! recorded. Annotated and augmented assignments are excluded.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::python::{preorder, ParsedFile};

pub struct DataFlowAnalyzer;

impl DataFlowAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Assignment target name -> simple names referenced in its RHS.
    pub fn analyse_file(&self, parsed: &ParsedFile) -> BTreeMap<String, BTreeSet<String>> {
        let mut flows: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for node in preorder(parsed.root_node()).filter(|n| n.kind() == "assignment") {
            if node.child_by_field_name("type").is_some() {
                continue;
            }
            let Some(target) = node
                .child_by_field_name("left")
                .and_then(|l| parsed.identifier(l))
            else {
                continue;
            };
            let Some(rhs) = node.child_by_field_name("right") else {
                continue;
            };
            // reassignments union into the same set
            flows
                .entry(target.to_string())
                .or_default()
                .extend(rhs_names(parsed, rhs));
        }
        flows
    }
}

impl Default for DataFlowAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifiers that act as value reads: attribute field names and keyword
/// argument names are not reads of a binding, so they are skipped (the
/// object of `obj.field` still counts).
fn is_value_read(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "attribute" => parent
            .child_by_field_name("attribute")
            .is_none_or(|attr| attr.id() != node.id()),
        "keyword_argument" => parent
            .child_by_field_name("name")
            .is_none_or(|name| name.id() != node.id()),
        _ => true,
    }
}

fn rhs_names(parsed: &ParsedFile, rhs: Node) -> BTreeSet<String> {
    preorder(rhs)
        .filter(|n| n.kind() == "identifier" && is_value_read(*n))
        .map(|n| parsed.node_text(&n).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonParser;

    fn flows(source: &str) -> BTreeMap<String, BTreeSet<String>> {
        let parsed = PythonParser::new().parse_source(source).unwrap();
        DataFlowAnalyzer::new().analyse_file(&parsed)
    }

    #[test]
    fn test_rhs_names_collected() {
        let result = flows("total = price * quantity\n");
        let names = &result["total"];
        assert!(names.contains("price"));
        assert!(names.contains("quantity"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_attribute_and_keyword_names_skipped() {
        let result = flows("resp = client.get(url, timeout=limit)\n");
        let names = &result["resp"];
        assert!(names.contains("client"));
        assert!(names.contains("url"));
        assert!(names.contains("limit"));
        assert!(!names.contains("get"));
        assert!(!names.contains("timeout"));
    }

    #[test]
    fn test_literal_rhs_has_empty_set() {
        let result = flows("count = 0\n");
        assert!(result["count"].is_empty());
    }

    #[test]
    fn test_annotated_and_augmented_excluded() {
        let result = flows("x: int = start\ny = start\ny += step\n");
        assert!(!result.contains_key("x"));
        assert_eq!(result["y"], BTreeSet::from(["start".to_string()]));
    }

    #[test]
    fn test_repeated_target_unions_sets() {
        let result = flows("x = a\nx = b\n");
        let names = &result["x"];
        assert!(names.contains("a"));
        assert!(names.contains("b"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_assignments_inside_functions_included() {
        let result = flows("def f(a):\n    out = a + 1\n    return out\n");
        assert!(result["out"].contains("a"));
    }
}
