//! Tallies control-flow constructs per module.

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct ControlFlowAnalyzer;

impl ControlFlowAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ControlFlowAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn construct_name(kind: &str) -> Option<&'static str> {
    match kind {
        "if_statement" => Some("If"),
        "for_statement" => Some("For"),
        "while_statement" => Some("While"),
        "try_statement" => Some("Try"),
        _ => None,
    }
}

impl Analyzer for ControlFlowAnalyzer {
    fn name(&self) -> &'static str {
        "control_flow"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let structures: Vec<String> = preorder(parsed.root_node())
            .filter_map(|n| construct_name(n.kind()))
            .map(str::to_string)
            .collect();
        if structures.is_empty() {
            return;
        }
        if let Some(mut elt) = repo.find_by_name(&file.stem) {
            elt.metadata.control_structures = structures;
            repo.save(elt);
        }
    }
}
