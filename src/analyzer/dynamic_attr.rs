//! Detects runtime attribute manipulation via `getattr` / `setattr`.

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

const ATTR_FUNCS: &[&str] = &["getattr", "setattr"];

pub struct DynamicAttrAnalyzer;

impl DynamicAttrAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DynamicAttrAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DynamicAttrAnalyzer {
    fn name(&self) -> &'static str {
        "dynamic_attr"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let found = preorder(parsed.root_node())
            .filter(|n| n.kind() == "call")
            .filter_map(|c| parsed.simple_call_name(c))
            .any(|name| ATTR_FUNCS.contains(&name));
        if !found {
            return;
        }
        if let Some(mut elt) = repo.find_by_name(&file.stem) {
            if elt.is_class() {
                elt.metadata.dynamic_attrs = true;
                repo.save(elt);
            }
        }
    }
}
