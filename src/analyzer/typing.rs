//! Merges PEP 484 annotations into already-discovered function elements.
//! Runs over methods too; whatever the name index currently resolves to is
//! what gets enriched.

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct TypingAnalyzer;

impl TypingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TypingAnalyzer {
    fn name(&self) -> &'static str {
        "typing"
    }

    fn analyse(&mut self, _file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node()).filter(|n| n.kind() == "function_definition") {
            let Some(fn_name) = node
                .child_by_field_name("name")
                .and_then(|n| parsed.identifier(n))
            else {
                continue;
            };
            let Some(mut elt) = repo.find_by_name(fn_name) else {
                continue;
            };
            if !elt.is_function() {
                continue;
            }

            for param in parsed.parameters(node) {
                if let Some(annotation) = param.annotation {
                    elt.metadata.param_types.insert(param.name, annotation);
                }
            }
            if let Some(ret) = parsed.return_type(node) {
                elt.metadata.return_type = Some(ret.to_string());
            }
            repo.save(elt);
        }
    }
}
