//! Synthetic `RAISES::` / `HANDLES::` edges on the file-stem element.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct ExceptionAnalyzer;

impl ExceptionAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExceptionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn tag_stem(file: &SourceFile, repo: &mut dyn ElementRepository, dep: &str) {
    if let Some(mut elt) = repo.find_by_name(&file.stem) {
        elt.add_dependency(dep);
        repo.save(elt);
    }
}

/// The exception type of an except clause, when it is a simple name
/// (optionally aliased with `as`).
fn handler_type<'a>(parsed: &'a ParsedFile, clause: Node<'a>) -> Option<&'a str> {
    let mut expr = clause.named_child(0)?;
    if expr.kind() == "as_pattern" {
        expr = expr.named_child(0)?;
    }
    parsed.identifier(expr)
}

impl Analyzer for ExceptionAnalyzer {
    fn name(&self) -> &'static str {
        "exception"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node()) {
            match node.kind() {
                "raise_statement" => {
                    let Some(exc) = node.named_child(0) else {
                        continue;
                    };
                    if exc.kind() != "call" {
                        continue;
                    }
                    if let Some(name) = parsed.simple_call_name(exc) {
                        tag_stem(file, repo, &format!("RAISES::{name}"));
                    }
                }
                "except_clause" => {
                    if let Some(name) = handler_type(parsed, node) {
                        tag_stem(file, repo, &format!("HANDLES::{name}"));
                    }
                }
                _ => {}
            }
        }
    }
}
