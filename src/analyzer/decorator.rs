//! Decorator edges. Creates a placeholder function element when the
//! decorated name has not been discovered yet (methods, most commonly).

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct DecoratorAnalyzer;

impl DecoratorAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecoratorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DecoratorAnalyzer {
    fn name(&self) -> &'static str {
        "decorator"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node()).filter(|n| n.kind() == "function_definition") {
            let Some(fn_name) = node
                .child_by_field_name("name")
                .and_then(|n| parsed.identifier(n))
            else {
                continue;
            };
            let mut elt = repo
                .find_by_name(fn_name)
                .unwrap_or_else(|| CodeElement::function(fn_name).with_source(&file.rel));
            for deco in parsed.decorators(node) {
                if let Some(name) = parsed.identifier(deco) {
                    elt.add_dependency(name);
                }
            }
            repo.save(elt);
        }
    }
}
