//! Creates one MODULE element per file and wires import edges.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

/// A module name pulled out of an import statement. Relative imports carry
/// the name with leading dots already stripped; a bare `from . import x`
/// yields an empty name and is dropped by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedModule {
    pub module: String,
    pub relative: bool,
}

fn dotted_name(parsed: &ParsedFile, node: Node) -> Option<String> {
    match node.kind() {
        "dotted_name" | "identifier" => Some(parsed.node_text(&node).to_string()),
        "aliased_import" => {
            let name = node.child_by_field_name("name")?;
            dotted_name(parsed, name)
        }
        _ => None,
    }
}

/// Every module named by an import anywhere in the file, including imports
/// local to a function or method body.
pub fn imported_modules(parsed: &ParsedFile) -> Vec<ImportedModule> {
    let mut out = Vec::new();
    for stmt in preorder(parsed.root_node()) {
        match stmt.kind() {
            "import_statement" => {
                let mut inner = stmt.walk();
                for child in stmt.named_children(&mut inner) {
                    if let Some(module) = dotted_name(parsed, child) {
                        out.push(ImportedModule {
                            module,
                            relative: false,
                        });
                    }
                }
            }
            "import_from_statement" => {
                let Some(module_node) = stmt.child_by_field_name("module_name") else {
                    continue;
                };
                match module_node.kind() {
                    "dotted_name" => out.push(ImportedModule {
                        module: parsed.node_text(&module_node).to_string(),
                        relative: false,
                    }),
                    "relative_import" => {
                        // `.pkg.mod` -> `pkg.mod`; a lone `.` yields ""
                        let text = parsed.node_text(&module_node);
                        out.push(ImportedModule {
                            module: text.trim_start_matches('.').to_string(),
                            relative: true,
                        });
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    out
}

pub struct ModuleGraphAnalyzer;

impl ModuleGraphAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ModuleGraphAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ModuleGraphAnalyzer {
    fn name(&self) -> &'static str {
        "module_graph"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let mut module =
            CodeElement::module(&file.stem, file.rel.clone()).with_source(&file.rel);
        for import in imported_modules(parsed) {
            if !import.module.is_empty() {
                module.add_dependency(&import.module);
            }
        }
        repo.save(module);
    }
}
