//! Tags the file-stem element with `WITH::<name>` for every `with` block
//! whose context expression is a direct call. A stem that matches no
//! element silently produces nothing.

use crate::analyzer::{Analyzer, SourceFile};
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

pub struct ContextManagerAnalyzer;

impl ContextManagerAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContextManagerAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ContextManagerAnalyzer {
    fn name(&self) -> &'static str {
        "context_manager"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for item in preorder(parsed.root_node()).filter(|n| n.kind() == "with_item") {
            let Some(mut expr) = item.child_by_field_name("value") else {
                continue;
            };
            if expr.kind() == "as_pattern" {
                match expr.named_child(0) {
                    Some(inner) => expr = inner,
                    None => continue,
                }
            }
            if expr.kind() != "call" {
                continue;
            }
            let Some(callee) = parsed.simple_call_name(expr) else {
                continue;
            };
            if let Some(mut elt) = repo.find_by_name(&file.stem) {
                elt.add_dependency(&format!("WITH::{callee}"));
                repo.save(elt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CodeElement;
    use crate::python::PythonParser;
    use crate::repository::InMemoryRepository;
    use std::path::Path;

    fn analyse_with(source: &str, repo: &mut InMemoryRepository) {
        let parsed = PythonParser::new().parse_source(source).unwrap();
        let file = SourceFile::new(Path::new("/p/io_util.py"), Path::new("/p")).unwrap();
        ContextManagerAnalyzer::new().analyse(&file, &parsed, repo);
    }

    #[test]
    fn test_with_call_tagged_on_module() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("io_util", "io_util.py").with_source("io_util.py"));
        analyse_with("with open(\"f\") as fh:\n    pass\n", &mut repo);

        let elt = repo.find_by_name("io_util").unwrap();
        assert!(elt.dependencies.contains("WITH::open"));
    }

    #[test]
    fn test_async_with() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("io_util", "io_util.py").with_source("io_util.py"));
        analyse_with(
            "async def f():\n    async with connect() as conn:\n        pass\n",
            &mut repo,
        );

        let elt = repo.find_by_name("io_util").unwrap();
        assert!(elt.dependencies.contains("WITH::connect"));
    }

    #[test]
    fn test_non_call_context_ignored() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("io_util", "io_util.py").with_source("io_util.py"));
        analyse_with("with lock:\n    pass\n", &mut repo);

        let elt = repo.find_by_name("io_util").unwrap();
        assert!(elt.dependencies.is_empty());
    }

    #[test]
    fn test_unmatched_stem_is_a_noop() {
        let mut repo = InMemoryRepository::new();
        analyse_with("with open(\"f\"):\n    pass\n", &mut repo);
        assert!(repo.is_empty());
    }
}
