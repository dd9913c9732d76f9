//! Finds configuration keys read through `getenv`, `ConfigParser` and
//! `load`-style calls with a string literal first argument.

use tree_sitter::Node;

use crate::analyzer::{Analyzer, SourceFile};
use crate::model::CodeElement;
use crate::python::{preorder, ParsedFile};
use crate::repository::ElementRepository;

const CONFIG_FUNCS: &[&str] = &["getenv", "ConfigParser", "load"];

pub struct ConfigAnalyzer;

impl ConfigAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn first_string_argument(parsed: &ParsedFile, call: Node) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    parsed.string_value(first)
}

impl Analyzer for ConfigAnalyzer {
    fn name(&self) -> &'static str {
        "config"
    }

    fn analyse(&mut self, file: &SourceFile, parsed: &ParsedFile, repo: &mut dyn ElementRepository) {
        for call in preorder(parsed.root_node()).filter(|n| n.kind() == "call") {
            let Some(name) = parsed.call_name(call) else {
                continue;
            };
            if !CONFIG_FUNCS.contains(&name) {
                continue;
            }
            if let Some(key) = first_string_argument(parsed, call) {
                if !key.is_empty() {
                    repo.save(CodeElement::config_key(key).with_source(&file.rel));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonParser;
    use crate::repository::InMemoryRepository;
    use std::path::Path;

    fn analyse(source: &str) -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        let parsed = PythonParser::new().parse_source(source).unwrap();
        let file = SourceFile::new(Path::new("/p/conf.py"), Path::new("/p")).unwrap();
        ConfigAnalyzer::new().analyse(&file, &parsed, &mut repo);
        repo
    }

    #[test]
    fn test_getenv_literal_key() {
        let repo = analyse("import os\nurl = os.getenv(\"DB_URL\")\n");
        let elt = repo.find_by_name("DB_URL").unwrap();
        assert_eq!(elt.kind_label(), "CONFIG_KEY");
    }

    #[test]
    fn test_load_with_literal_path() {
        let repo = analyse("cfg = load(\"settings.yaml\")\n");
        assert!(repo.find_by_name("settings.yaml").is_some());
    }

    #[test]
    fn test_variable_argument_skipped() {
        let repo = analyse("url = os.getenv(key)\n");
        assert!(repo.is_empty());
    }

    #[test]
    fn test_unrelated_call_skipped() {
        let repo = analyse("x = open(\"data.txt\")\n");
        assert!(repo.is_empty());
    }
}
