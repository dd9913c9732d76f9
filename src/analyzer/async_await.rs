//! Marks async functions and records awaited call edges.

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{is_async_def, preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct AsyncAnalyzer;

impl AsyncAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AsyncAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for AsyncAnalyzer {
    fn name(&self) -> &'static str {
        "async"
    }

    fn analyse(&mut self, _file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for node in preorder(parsed.root_node())
            .filter(|n| n.kind() == "function_definition" && is_async_def(*n))
        {
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
            elt.metadata.is_async = true;
            for awaited in preorder(node).filter(|n| n.kind() == "await") {
                let Some(inner) = awaited.named_child(0) else {
                    continue;
                };
                if inner.kind() == "call" {
                    if let Some(callee) = parsed.simple_call_name(inner) {
                        elt.add_dependency(callee);
                    }
                }
            }
            repo.save(elt);
        }
    }
}
