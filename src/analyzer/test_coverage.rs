//! Links test files to the modules they import via `COVERS::` edges.

use crate::analyzer::module_graph::imported_modules;
use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::ParsedFile;
use crate::repository::ElementRepository;

pub struct TestCoverageAnalyzer;

impl TestCoverageAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TestCoverageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TestCoverageAnalyzer {
    fn name(&self) -> &'static str {
        "test_coverage"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        if !file.is_test_file() {
            return;
        }
        let covered: Vec<String> = imported_modules(parsed)
            .into_iter()
            .filter(|i| !i.module.is_empty())
            .map(|i| i.module)
            .collect();
        if covered.is_empty() {
            return;
        }
        let mut elt = repo.find_by_name(&file.stem).unwrap_or_else(|| {
            CodeElement::module(&file.stem, file.rel.clone()).with_source(&file.rel)
        });
        for module in covered {
            elt.add_dependency(&format!("COVERS::{module}"));
        }
        repo.save(elt);
    }
}
