//! Class discovery: name, inheritance, constructor parameters, attributes,
//! methods.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct ClassAnalyzer;

impl ClassAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn build_element(&self, file: &SourceFile, parsed: &ParsedFile, node: Node) -> CodeElement {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(&n).to_string())
            .unwrap_or_default();
        let mut elt = CodeElement::class(name).with_source(&file.rel);

        if let Some(bases) = node.child_by_field_name("superclasses") {
            let mut cursor = bases.walk();
            for base in bases.named_children(&mut cursor) {
                if let Some(base_name) = base_name(parsed, base) {
                    elt.set_superclass(base_name);
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for item in body.named_children(&mut cursor) {
                match unwrap_decorated(item).kind() {
                    "function_definition" => {
                        self.record_method(parsed, unwrap_decorated(item), &mut elt)
                    }
                    "expression_statement" => {
                        self.record_class_attribute(parsed, item, &mut elt)
                    }
                    _ => {}
                }
            }
        }

        elt
    }

    fn record_method(&self, parsed: &ParsedFile, func: Node, elt: &mut CodeElement) {
        let Some(name) = func
            .child_by_field_name("name")
            .map(|n| parsed.node_text(&n).to_string())
        else {
            return;
        };
        if name == "__init__" {
            self.record_constructor(parsed, func, elt);
        } else {
            elt.add_method(&name);
        }
    }

    fn record_constructor(&self, parsed: &ParsedFile, func: Node, elt: &mut CodeElement) {
        // parameters minus `self`
        for param in parsed.parameters(func).into_iter().skip(1) {
            elt.add_dependency(&param.name);
            elt.metadata.ctor_params.push(param.name);
        }

        for node in preorder(func).filter(|n| n.kind() == "assignment") {
            self.record_attribute_assign(parsed, node, elt);
        }
    }

    /// `self.x = rhs` inside the constructor: remember the attribute name,
    /// and a simple call or name on the right becomes an edge.
    fn record_attribute_assign(&self, parsed: &ParsedFile, assign: Node, elt: &mut CodeElement) {
        let Some(left) = assign.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "attribute" {
            return;
        }
        let is_self = left
            .child_by_field_name("object")
            .and_then(|obj| parsed.identifier(obj))
            == Some("self");
        if !is_self {
            return;
        }
        if let Some(attr) = left
            .child_by_field_name("attribute")
            .and_then(|a| parsed.identifier(a))
        {
            elt.metadata.attributes.push(attr.to_string());
        }

        let Some(rhs) = assign.child_by_field_name("right") else {
            return;
        };
        match rhs.kind() {
            "call" => {
                if let Some(callee) = parsed.simple_call_name(rhs) {
                    elt.add_dependency(callee);
                }
            }
            "identifier" => elt.add_dependency(parsed.node_text(&rhs)),
            _ => {}
        }
    }

    fn record_class_attribute(&self, parsed: &ParsedFile, stmt: Node, elt: &mut CodeElement) {
        let mut cursor = stmt.walk();
        for assign in stmt.named_children(&mut cursor) {
            if assign.kind() != "assignment" {
                continue;
            }
            if let Some(name) = assign
                .child_by_field_name("left")
                .and_then(|l| parsed.identifier(l))
            {
                elt.metadata.class_attributes.push(name.to_string());
            }
        }
    }
}

impl Default for ClassAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ClassAnalyzer {
    fn name(&self) -> &'static str {
        "class"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node()).filter(|n| n.kind() == "class_definition") {
            let elt = self.build_element(file, parsed, node);
            repo.save(elt);
        }
    }
}

/// Base class reference: identifier, or the attribute name of a dotted base.
/// Keyword arguments (metaclass=...) and subscripted bases are ignored.
fn base_name<'a>(parsed: &'a ParsedFile, base: Node<'a>) -> Option<&'a str> {
    match base.kind() {
        "identifier" => Some(parsed.node_text(&base)),
        "attribute" => base
            .child_by_field_name("attribute")
            .and_then(|a| parsed.identifier(a)),
        _ => None,
    }
}

fn unwrap_decorated(node: Node) -> Node {
    if node.kind() == "decorated_definition" {
        if let Some(inner) = node.child_by_field_name("definition") {
            return inner;
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;
    use crate::python::PythonParser;
    use crate::repository::InMemoryRepository;
    use std::path::Path;

    fn analyse(source: &str) -> InMemoryRepository {
        let parsed = PythonParser::new().parse_source(source).unwrap();
        let file = SourceFile::new(Path::new("/p/b.py"), Path::new("/p")).unwrap();
        let mut repo = InMemoryRepository::new();
        ClassAnalyzer::new().analyse(&file, &parsed, &mut repo);
        repo
    }

    #[test]
    fn test_class_with_ctor_and_attribute() {
        let repo = analyse(
            "class B(A):\n    def __init__(self, y):\n        self.z = y\n",
        );
        let elt = repo.find_by_name("B").unwrap();
        match &elt.kind {
            ElementKind::Class { superclass, .. } => {
                assert_eq!(superclass.as_deref(), Some("A"));
            }
            _ => panic!("expected class"),
        }
        assert!(elt.dependencies.contains("A"));
        assert!(elt.dependencies.contains("y"));
        assert_eq!(elt.metadata.ctor_params, vec!["y"]);
        assert_eq!(elt.metadata.attributes, vec!["z"]);
    }

    #[test]
    fn test_methods_listed_in_order() {
        let repo = analyse(
            "class C:\n    def run(self):\n        pass\n    def stop(self):\n        pass\n",
        );
        let elt = repo.find_by_name("C").unwrap();
        match &elt.kind {
            ElementKind::Class { methods, .. } => {
                assert_eq!(methods, &vec!["run".to_string(), "stop".to_string()]);
            }
            _ => panic!("expected class"),
        }
    }

    #[test]
    fn test_decorated_method_counts() {
        let repo = analyse(
            "class C:\n    @property\n    def value(self):\n        return 1\n",
        );
        let elt = repo.find_by_name("C").unwrap();
        match &elt.kind {
            ElementKind::Class { methods, .. } => assert_eq!(methods, &vec!["value".to_string()]),
            _ => panic!("expected class"),
        }
    }

    #[test]
    fn test_attribute_rhs_call_becomes_dependency() {
        let repo = analyse(
            "class C:\n    def __init__(self):\n        self.client = HttpClient()\n",
        );
        let elt = repo.find_by_name("C").unwrap();
        assert!(elt.dependencies.contains("HttpClient"));
        assert_eq!(elt.metadata.attributes, vec!["client"]);
    }

    #[test]
    fn test_class_level_attributes() {
        let repo = analyse("class C:\n    TABLE = \"users\"\n    LIMIT = 10\n");
        let elt = repo.find_by_name("C").unwrap();
        assert_eq!(elt.metadata.class_attributes, vec!["TABLE", "LIMIT"]);
    }

    #[test]
    fn test_first_base_is_superclass_all_bases_are_edges() {
        let repo = analyse("class C(A, Mixin):\n    pass\n");
        let elt = repo.find_by_name("C").unwrap();
        match &elt.kind {
            ElementKind::Class { superclass, .. } => {
                assert_eq!(superclass.as_deref(), Some("A"));
            }
            _ => panic!("expected class"),
        }
        assert!(elt.dependencies.contains("Mixin"));
    }

    #[test]
    fn test_metaclass_keyword_ignored() {
        let repo = analyse("class C(Base, metaclass=Meta):\n    pass\n");
        let elt = repo.find_by_name("C").unwrap();
        match &elt.kind {
            ElementKind::Class { superclass, .. } => {
                assert_eq!(superclass.as_deref(), Some("Base"));
            }
            _ => panic!("expected class"),
        }
        assert!(!elt.dependencies.contains("Meta"));
    }
}
