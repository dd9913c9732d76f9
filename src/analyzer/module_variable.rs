//! Records module-level variable assignments as VARIABLE elements.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::ParsedFile;
use crate::repository::ElementRepository;

pub struct ModuleVariableAnalyzer;

impl ModuleVariableAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn record_targets(
        &self,
        file: &SourceFile,
        parsed: &ParsedFile,
        target: Node,
        repo: &mut dyn ElementRepository,
    ) {
        match target.kind() {
            "identifier" => {
                let name = parsed.node_text(&target);
                repo.save(CodeElement::variable(name).with_source(&file.rel));
            }
            "pattern_list" | "tuple_pattern" => {
                let mut cursor = target.walk();
                for child in target.named_children(&mut cursor) {
                    if let Some(name) = parsed.identifier(child) {
                        repo.save(CodeElement::variable(name).with_source(&file.rel));
                    }
                }
            }
            _ => {}
        }
    }
}

impl Default for ModuleVariableAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ModuleVariableAnalyzer {
    fn name(&self) -> &'static str {
        "module_variable"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let root = parsed.root_node();
        let mut cursor = root.walk();
        for stmt in root.named_children(&mut cursor) {
            if stmt.kind() != "expression_statement" {
                continue;
            }
            let Some(expr) = stmt.named_child(0) else {
                continue;
            };
            if expr.kind() != "assignment" {
                continue;
            }
            if let Some(target) = expr.child_by_field_name("left") {
                self.record_targets(file, parsed, target, repo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonParser;
    use crate::repository::InMemoryRepository;
    use std::path::Path;

    fn analyse(source: &str) -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        let parsed = PythonParser::new().parse_source(source).unwrap();
        let file = SourceFile::new(Path::new("/p/settings.py"), Path::new("/p")).unwrap();
        ModuleVariableAnalyzer::new().analyse(&file, &parsed, &mut repo);
        repo
    }

    #[test]
    fn test_simple_assignment() {
        let repo = analyse("DEBUG = True\n");
        let elt = repo.find_by_name("DEBUG").unwrap();
        assert_eq!(elt.kind_label(), "VARIABLE");
    }

    #[test]
    fn test_tuple_unpacking() {
        let repo = analyse("host, port = \"localhost\", 8000\n");
        assert!(repo.find_by_name("host").is_some());
        assert!(repo.find_by_name("port").is_some());
    }

    #[test]
    fn test_function_local_assignment_skipped() {
        let repo = analyse("def f():\n    local = 1\n");
        assert!(repo.find_by_name("local").is_none());
    }

    #[test]
    fn test_augmented_assignment_skipped() {
        let repo = analyse("total = 0\ntotal += 1\n");
        assert!(repo.find_by_name("total").is_some());
        assert_eq!(repo.len(), 1);
    }
}
