//! The analyzer family.
//!
//! Each analyzer recognizes one syntactic pattern in a parsed file and
//! records facts into the shared repository. Analyzers are independent of
//! each other's internal state, but enrichment passes read elements that
//! discovery passes wrote, so the coordinator runs them in an explicit
//! stage order (see [`coordinator`]).

pub mod async_await;
pub mod class;
pub mod config;
pub mod context_manager;
pub mod control_flow;
pub mod coordinator;
pub mod data_flow;
pub mod decorator;
pub mod dynamic_attr;
pub mod entry_point;
pub mod exception;
pub mod external_deps;
pub mod function;
pub mod meta_programming;
pub mod module_graph;
pub mod module_variable;
pub mod package;
pub mod package_metadata;
pub mod test_coverage;
pub mod typing;

pub use coordinator::CodeAnalyzer;
pub use data_flow::DataFlowAnalyzer;
pub use external_deps::ExternalDependencyAnalyzer;

use std::path::{Path, PathBuf};

use crate::python::ParsedFile;
use crate::repository::ElementRepository;

/// One source file, with path normalization done once by the coordinator so
/// every pass sees identical relative paths.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Root-relative path with forward slashes; the form embedded in the
    /// graph document.
    pub rel: String,
    /// File stem, the key module-level enrichers use for element lookup.
    pub stem: String,
}

impl SourceFile {
    pub fn new(path: &Path, root: &Path) -> Option<Self> {
        let rel_path = path.strip_prefix(root).ok()?;
        let rel = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            rel,
            stem,
        })
    }

    /// True for files under a `tests` directory or named `test_*`.
    pub fn is_test_file(&self) -> bool {
        self.rel.split('/').any(|part| part == "tests")
            || self
                .rel
                .rsplit('/')
                .next()
                .is_some_and(|name| name.starts_with("test_"))
    }
}

/// Common contract for all per-file passes.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    /// Inspect one parsed file and record facts into the repository.
    /// Called once per file per analyzer.
    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository);

    /// Project-wide pass, called exactly once after all files are processed.
    fn finalize(&mut self, _root: &Path, _repo: &mut dyn ElementRepository) {}
}
