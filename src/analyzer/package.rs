//! Creates PACKAGE elements from `__init__.py` markers.

use std::path::Path;

use ignore::WalkBuilder;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::ParsedFile;
use crate::repository::ElementRepository;

pub struct PackageAnalyzer;

impl PackageAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PackageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PackageAnalyzer {
    fn name(&self) -> &'static str {
        "package"
    }

    fn analyse(
        &mut self,
        _file: &SourceFile,
        _parsed: &ParsedFile,
        _repo: &mut dyn ElementRepository,
    ) {
    }

    fn finalize(&mut self, root: &Path, repo: &mut dyn ElementRepository) {
        for entry in WalkBuilder::new(root).build().flatten() {
            let path = entry.path();
            if path.file_name().is_none_or(|n| n != "__init__.py") {
                continue;
            }
            let Some(parent) = path.parent() else {
                continue;
            };
            let Ok(rel) = parent.strip_prefix(root) else {
                continue;
            };
            let dotted = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join(".");
            // a marker directly in the root names no package
            if dotted.is_empty() {
                continue;
            }
            let mut package = CodeElement::package(&dotted);
            if let Some((parent_pkg, _)) = dotted.rsplit_once('.') {
                package.add_dependency(parent_pkg);
            }
            repo.save(package);
        }
    }
}
