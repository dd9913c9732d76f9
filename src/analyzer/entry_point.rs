//! Flags modules guarded by `if __name__ == "__main__"`.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::ParsedFile;
use crate::repository::ElementRepository;

pub struct EntryPointAnalyzer;

impl EntryPointAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EntryPointAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Crude check: the comparison mentions both the `__name__` identifier and a
/// `"__main__"` literal, on either side.
fn is_main_guard(parsed: &ParsedFile, condition: Node) -> bool {
    if condition.kind() != "comparison_operator" {
        return false;
    }
    let mut saw_name = false;
    let mut saw_main = false;
    let mut cursor = condition.walk();
    for operand in condition.named_children(&mut cursor) {
        match operand.kind() {
            "identifier" if parsed.node_text(&operand) == "__name__" => saw_name = true,
            "string" => {
                if parsed.string_value(operand).as_deref() == Some("__main__") {
                    saw_main = true;
                }
            }
            _ => {}
        }
    }
    saw_name && saw_main
}

impl Analyzer for EntryPointAnalyzer {
    fn name(&self) -> &'static str {
        "entry_point"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let root = parsed.root_node();
        let mut cursor = root.walk();
        for stmt in root.named_children(&mut cursor) {
            if stmt.kind() != "if_statement" {
                continue;
            }
            let Some(condition) = stmt.child_by_field_name("condition") else {
                continue;
            };
            if !is_main_guard(parsed, condition) {
                continue;
            }
            if let Some(mut elt) = repo.find_by_name(&file.stem) {
                if elt.is_module() {
                    elt.metadata.entry_point = true;
                    repo.save(elt);
                }
            }
        }
    }
}
