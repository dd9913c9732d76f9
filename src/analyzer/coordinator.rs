//! Runs the analyzer pipeline over a source tree and assembles the graph.
//!
//! Passes run in a fixed two-stage order per file: discovery first (passes
//! that create elements), then enrichment (passes that look elements up by
//! name). Finalize hooks run exactly once after the last file. The run is
//! single-threaded; determinism comes from the sorted file walk.

use std::path::Path;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzer::async_await::AsyncAnalyzer;
use crate::analyzer::class::ClassAnalyzer;
use crate::analyzer::config::ConfigAnalyzer;
use crate::analyzer::context_manager::ContextManagerAnalyzer;
use crate::analyzer::control_flow::ControlFlowAnalyzer;
use crate::analyzer::data_flow::DataFlowAnalyzer;
use crate::analyzer::decorator::DecoratorAnalyzer;
use crate::analyzer::dynamic_attr::DynamicAttrAnalyzer;
use crate::analyzer::entry_point::EntryPointAnalyzer;
use crate::analyzer::exception::ExceptionAnalyzer;
use crate::analyzer::external_deps::ExternalDependencyAnalyzer;
use crate::analyzer::function::FunctionAnalyzer;
use crate::analyzer::meta_programming::MetaProgrammingAnalyzer;
use crate::analyzer::module_graph::ModuleGraphAnalyzer;
use crate::analyzer::module_variable::ModuleVariableAnalyzer;
use crate::analyzer::package::PackageAnalyzer;
use crate::analyzer::package_metadata::read_package_metadata;
use crate::analyzer::test_coverage::TestCoverageAnalyzer;
use crate::analyzer::typing::TypingAnalyzer;
use crate::analyzer::{Analyzer, SourceFile};
use crate::error::Result;
use crate::graph::{DataFlows, KnowledgeGraph};
use crate::python::PythonParser;
use crate::repository::{ElementRepository, InMemoryRepository};
use crate::walker::SourceWalker;

pub struct CodeAnalyzer;

impl CodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Full analysis of the tree rooted at `root`.
    pub fn analyse(&self, root: &Path) -> Result<KnowledgeGraph> {
        let mut repo = InMemoryRepository::new();
        let root = std::fs::canonicalize(root)?;
        let files = SourceWalker::new().walk(&root)?;
        info!(root = %root.display(), files = files.len(), "starting analysis");

        // Discovery passes create elements; enrichment passes find them by
        // name. The order within each stage matters and matches the list in
        // the module docs.
        let mut discovery: Vec<Box<dyn Analyzer>> = vec![
            Box::new(ModuleGraphAnalyzer::new()),
            Box::new(ClassAnalyzer::new()),
            Box::new(FunctionAnalyzer::new()),
            Box::new(ModuleVariableAnalyzer::new()),
            Box::new(ConfigAnalyzer::new()),
        ];
        let mut enrichment: Vec<Box<dyn Analyzer>> = vec![
            Box::new(TypingAnalyzer::new()),
            Box::new(DecoratorAnalyzer::new()),
            Box::new(AsyncAnalyzer::new()),
            Box::new(ContextManagerAnalyzer::new()),
            Box::new(ControlFlowAnalyzer::new()),
            Box::new(ExceptionAnalyzer::new()),
            Box::new(EntryPointAnalyzer::new()),
            Box::new(DynamicAttrAnalyzer::new()),
            Box::new(MetaProgrammingAnalyzer::new()),
            Box::new(TestCoverageAnalyzer::new()),
        ];
        let mut external = ExternalDependencyAnalyzer::new();
        let mut packages = PackageAnalyzer::new();
        let data_flow = DataFlowAnalyzer::new();

        let parser = PythonParser::new();
        let mut rel_files = Vec::new();
        let mut data_flows = DataFlows::new();

        for path in &files {
            let Some(file) = SourceFile::new(path, &root) else {
                continue;
            };
            rel_files.push(file.rel.clone());

            let parsed = match parser.parse_file(path) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(file = %file.rel, %err, "skipping unparseable file");
                    continue;
                }
            };

            for analyzer in discovery.iter_mut() {
                analyzer.analyse(&file, &parsed, &mut repo);
            }
            for analyzer in enrichment.iter_mut() {
                analyzer.analyse(&file, &parsed, &mut repo);
            }
            external.analyse(&file, &parsed, &mut repo);

            let flows = data_flow.analyse_file(&parsed);
            if !flows.is_empty() {
                data_flows.insert(file.rel.clone(), flows);
            }
        }

        for analyzer in discovery.iter_mut().chain(enrichment.iter_mut()) {
            analyzer.finalize(&root, &mut repo);
        }
        external.finalize(&root, &mut repo);
        packages.finalize(&root, &mut repo);

        let package_metadata = match read_package_metadata(&root) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "pyproject.toml unreadable, continuing without it");
                None
            }
        };

        let mut elements = repo.all_elements();
        elements.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.kind_label().cmp(b.kind_label()))
        });
        info!(elements = elements.len(), "analysis complete");

        Ok(KnowledgeGraph {
            files: rel_files,
            elements,
            data_flows,
            external_dependencies: external.take_results(),
            package_metadata,
            analysis_id: Uuid::new_v4(),
            root: root.to_string_lossy().into_owned(),
        })
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
