//! Top-level function discovery. Methods inside classes are left to the
//! class pass; everything else that defines a function lands here, with
//! parameters, annotations, called names, decorators, and the async flag.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{in_class, is_async_def, preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct FunctionAnalyzer;

impl FunctionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn build_element(&self, file: &SourceFile, parsed: &ParsedFile, node: Node) -> CodeElement {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(&n).to_string())
            .unwrap_or_default();
        let mut elt = CodeElement::function(name).with_source(&file.rel);

        for param in parsed.parameters(node) {
            elt.add_parameter(&param.name);
            if let Some(annotation) = param.annotation {
                elt.metadata.param_types.insert(param.name, annotation);
            }
        }
        if let Some(ret) = parsed.return_type(node) {
            elt.metadata.return_type = Some(ret.to_string());
        }

        for call in preorder(node).filter(|n| n.kind() == "call") {
            if let Some(callee) = parsed.simple_call_name(call) {
                elt.add_dependency(callee);
            }
        }

        for deco in parsed.decorators(node) {
            if let Some(name) = parsed.identifier(deco) {
                elt.add_dependency(name);
            }
        }

        if is_async_def(node) {
            elt.metadata.is_async = true;
        }

        elt
    }
}

impl Default for FunctionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for FunctionAnalyzer {
    fn name(&self) -> &'static str {
        "function"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node()).filter(|n| n.kind() == "function_definition") {
            if in_class(node) {
                continue;
            }
            let elt = self.build_element(file, parsed, node);
            repo.save(elt);
        }
    }
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
        let file = SourceFile::new(Path::new("/p/m.py"), Path::new("/p")).unwrap();
        let mut repo = InMemoryRepository::new();
        FunctionAnalyzer::new().analyse(&file, &parsed, &mut repo);
        repo
    }

    fn parameters(elt: &CodeElement) -> &[String] {
        match &elt.kind {
            ElementKind::Function { parameters } => parameters,
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_typed_function() {
        let repo = analyse("def f(x: int) -> str:\n    return str(x)\n");
        let elt = repo.find_by_name("f").unwrap();
        assert_eq!(parameters(&elt), ["x"]);
        assert_eq!(elt.metadata.param_types.get("x").map(String::as_str), Some("int"));
        assert_eq!(elt.metadata.return_type.as_deref(), Some("str"));
    }

    #[test]
    fn test_called_names_become_dependencies() {
        let repo = analyse("def f():\n    g()\n    h(1)\n    obj.m()\n");
        let elt = repo.find_by_name("f").unwrap();
        assert!(elt.dependencies.contains("g"));
        assert!(elt.dependencies.contains("h"));
        // attribute calls are not simple names
        assert!(!elt.dependencies.contains("m"));
    }

    #[test]
    fn test_methods_are_skipped() {
        let repo = analyse("class C:\n    def m(self):\n        pass\n\ndef f():\n    pass\n");
        assert!(repo.find_by_name("f").is_some());
        assert!(repo.find_by_name("m").is_none());
    }

    #[test]
    fn test_decorator_dependencies() {
        let repo = analyse("@cached\ndef f():\n    pass\n");
        let elt = repo.find_by_name("f").unwrap();
        assert!(elt.dependencies.contains("cached"));
    }

    #[test]
    fn test_async_flag() {
        let repo = analyse("async def f():\n    pass\n\ndef g():\n    pass\n");
        assert!(repo.find_by_name("f").unwrap().metadata.is_async);
        assert!(!repo.find_by_name("g").unwrap().metadata.is_async);
    }

    #[test]
    fn test_nested_function_is_discovered() {
        let repo = analyse("def outer():\n    def inner():\n        pass\n");
        assert!(repo.find_by_name("outer").is_some());
        assert!(repo.find_by_name("inner").is_some());
    }

    #[test]
    fn test_self_call_excluded_from_dependencies() {
        let repo = analyse("def f(n):\n    return f(n - 1) if n else 0\n");
        let elt = repo.find_by_name("f").unwrap();
        assert!(!elt.dependencies.contains("f"));
    }
}
