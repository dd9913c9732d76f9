//! Third-party dependency tracking.
//!
//! Per file, records the top-level name of every absolute import together
//! with the importing path. Classification happens retroactively in
//! `finalize`, once the whole tree has been walked: names that are part of
//! the analyzed project itself or of the standard library are pruned, and
//! installed versions are resolved for the rest.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ignore::WalkBuilder;
use tracing::debug;

use crate::analyzer::module_graph::imported_modules;
use crate::analyzer::{Analyzer, SourceFile};
use crate::dependencies::{is_stdlib, SitePackages};
use crate::graph::ExternalDependency;
use crate::model::CodeElement;
use crate::python::ParsedFile;
use crate::repository::ElementRepository;

pub struct ExternalDependencyAnalyzer {
    /// Top-level imported name -> relative paths that import it.
    usage: BTreeMap<String, BTreeSet<String>>,
    site_packages: SitePackages,
    resolved: Vec<ExternalDependency>,
}

impl ExternalDependencyAnalyzer {
    pub fn new() -> Self {
        Self {
            usage: BTreeMap::new(),
            site_packages: SitePackages::discover(),
            resolved: Vec::new(),
        }
    }

    #[cfg(test)]
    fn with_site_packages(site_packages: SitePackages) -> Self {
        Self {
            usage: BTreeMap::new(),
            site_packages,
            resolved: Vec::new(),
        }
    }

    /// Results computed by `finalize`, sorted by package name.
    pub fn take_results(&mut self) -> Vec<ExternalDependency> {
        std::mem::take(&mut self.resolved)
    }

    /// Names that resolve inside the project: the root directory itself plus
    /// the top directory of every package marker found under it.
    fn internal_names(root: &Path) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        if let Some(dir) = root.file_name() {
            names.insert(dir.to_string_lossy().into_owned());
        }
        for entry in WalkBuilder::new(root).hidden(true).build().flatten() {
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
            if let Some(first) = rel.components().next() {
                names.insert(first.as_os_str().to_string_lossy().into_owned());
            }
        }
        names
    }
}

impl Default for ExternalDependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ExternalDependencyAnalyzer {
    fn name(&self) -> &'static str {
        "external_deps"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, _repo: &mut dyn ElementRepository) {
        for import in imported_modules(parsed) {
            if import.relative || import.module.is_empty() {
                continue;
            }
            let top = import
                .module
                .split('.')
                .next()
                .unwrap_or(&import.module)
                .to_string();
            self.usage.entry(top).or_default().insert(file.rel.clone());
        }
    }

    fn finalize(&mut self, root: &Path, repo: &mut dyn ElementRepository) {
        let internal = Self::internal_names(root);
        let usage = std::mem::take(&mut self.usage);
        for (package, used_by) in usage {
            if is_stdlib(&package) || internal.contains(&package) {
                continue;
            }
            let version = self.site_packages.version(&package);
            if version.is_none() {
                debug!(package = %package, "no installed version found");
            }
            repo.save(CodeElement::external_lib(&package));
            self.resolved.push(ExternalDependency {
                package,
                version,
                used_by: used_by.into_iter().collect(),
            });
        }
    }
}
