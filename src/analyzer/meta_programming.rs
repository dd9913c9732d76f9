//! Detects dynamic code execution: `exec`, `eval`, `type`, `compile`,
//! `import_module`.

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

const META_FUNCS: &[&str] = &["exec", "eval", "type", "compile", "import_module"];

pub struct MetaProgrammingAnalyzer;

impl MetaProgrammingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetaProgrammingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MetaProgrammingAnalyzer {
    fn name(&self) -> &'static str {
        "meta_programming"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        let found = preorder(parsed.root_node())
            .filter(|n| n.kind() == "call")
            .filter_map(|c| parsed.call_name(c))
            .any(|name| META_FUNCS.contains(&name));
        if !found {
            return;
        }
        let mut elt = repo
            .find_by_name(&file.stem)
            .filter(|e| e.is_module())
            .unwrap_or_else(|| {
                CodeElement::module(&file.stem, file.rel.clone()).with_source(&file.rel)
            });
        elt.metadata.dynamic_code = true;
        repo.save(elt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonParser;
    use crate::repository::InMemoryRepository;
    use std::path::Path;

    fn analyse_with(source: &str, repo: &mut InMemoryRepository) {
        let parsed = PythonParser::new().parse_source(source).unwrap();
        let file = SourceFile::new(Path::new("/p/loader.py"), Path::new("/p")).unwrap();
        MetaProgrammingAnalyzer::new().analyse(&file, &parsed, repo);
    }

    #[test]
    fn test_eval_marks_module() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("loader", "loader.py").with_source("loader.py"));
        analyse_with("result = eval(expr)\n", &mut repo);
        assert!(repo.find_by_name("loader").unwrap().metadata.dynamic_code);
    }

    #[test]
    fn test_import_module_attribute_callee_matches() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("loader", "loader.py").with_source("loader.py"));
        analyse_with("mod = importlib.import_module(name)\n", &mut repo);
        assert!(repo.find_by_name("loader").unwrap().metadata.dynamic_code);
    }

    #[test]
    fn test_creates_module_when_stem_missing() {
        let mut repo = InMemoryRepository::new();
        analyse_with("exec(code)\n", &mut repo);
        let elt = repo.find_by_name("loader").unwrap();
        assert!(elt.is_module());
        assert!(elt.metadata.dynamic_code);
    }

    #[test]
    fn test_plain_code_is_ignored() {
        let mut repo = InMemoryRepository::new();
        repo.save(CodeElement::module("loader", "loader.py").with_source("loader.py"));
        analyse_with("x = parse(data)\n", &mut repo);
        assert!(!repo.find_by_name("loader").unwrap().metadata.dynamic_code);
    }
}
