//! Python syntax tree provider and traversal helpers.
//!
//! Wraps tree-sitter with the small vocabulary the analyzer passes need:
//! preorder traversal, parameter/annotation extraction, callee names,
//! string literal contents, decorator lists.

use std::path::Path;

use tree_sitter::{Node, TreeCursor};

use crate::error::{GraphError, Result};

pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a file, treating undecodable bytes and syntax errors as
    /// "unparseable". No partial trees are ever returned.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source)
    }

    pub fn parse_source(&self, source: &str) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| GraphError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| GraphError::Parse("failed to parse source".to_string()))?;

        if tree.root_node().has_error() {
            return Err(GraphError::Parse("syntax error".to_string()));
        }

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
        })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A function or method parameter with its optional simple annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    /// Text of `node` when it is a plain identifier.
    pub fn identifier(&self, node: Node) -> Option<&str> {
        (node.kind() == "identifier").then(|| self.node_text(&node))
    }

    /// Callee name of a call whose function is a plain identifier.
    pub fn simple_call_name(&self, call: Node) -> Option<&str> {
        let func = call.child_by_field_name("function")?;
        self.identifier(func)
    }

    /// Callee name of a call: a plain identifier, or the final attribute of
    /// an attribute access (`cfg.load(...)` -> `load`).
    pub fn call_name(&self, call: Node) -> Option<&str> {
        let func = call.child_by_field_name("function")?;
        match func.kind() {
            "identifier" => Some(self.node_text(&func)),
            "attribute" => {
                let attr = func.child_by_field_name("attribute")?;
                self.identifier(attr)
            }
            _ => None,
        }
    }

    /// Content of a string literal node, without quotes or prefixes.
    pub fn string_value(&self, node: Node) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let mut out = String::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "string_content" {
                out.push_str(self.node_text(&child));
            }
        }
        Some(out)
    }

    /// Positional parameters of a `function_definition`, in order. Splat and
    /// separator markers are skipped.
    pub fn parameters(&self, func: Node) -> Vec<Param> {
        let mut params = Vec::new();
        let Some(list) = func.child_by_field_name("parameters") else {
            return params;
        };
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => params.push(Param {
                    name: self.node_text(&child).to_string(),
                    annotation: None,
                }),
                "typed_parameter" => {
                    let Some(name) = child.named_child(0).and_then(|n| self.identifier(n)) else {
                        continue;
                    };
                    let annotation = child
                        .child_by_field_name("type")
                        .and_then(|t| self.type_identifier(t))
                        .map(str::to_string);
                    params.push(Param {
                        name: name.to_string(),
                        annotation,
                    });
                }
                "default_parameter" => {
                    if let Some(name) = child
                        .child_by_field_name("name")
                        .and_then(|n| self.identifier(n))
                    {
                        params.push(Param {
                            name: name.to_string(),
                            annotation: None,
                        });
                    }
                }
                "typed_default_parameter" => {
                    let Some(name) = child
                        .child_by_field_name("name")
                        .and_then(|n| self.identifier(n))
                    else {
                        continue;
                    };
                    let annotation = child
                        .child_by_field_name("type")
                        .and_then(|t| self.type_identifier(t))
                        .map(str::to_string);
                    params.push(Param {
                        name: name.to_string(),
                        annotation,
                    });
                }
                _ => {}
            }
        }
        params
    }

    /// Return annotation of a `function_definition` when it is a simple name.
    pub fn return_type<'a>(&'a self, func: Node<'a>) -> Option<&'a str> {
        func.child_by_field_name("return_type")
            .and_then(|t| self.type_identifier(t))
    }

    /// Unwraps a `type` node down to a plain identifier, if that is all it is.
    /// Subscripts, unions and the like are ignored on purpose.
    pub fn type_identifier<'a>(&'a self, node: Node<'a>) -> Option<&'a str> {
        match node.kind() {
            "identifier" => Some(self.node_text(&node)),
            "type" if node.named_child_count() == 1 => {
                let inner = node.named_child(0)?;
                self.identifier(inner)
            }
            _ => None,
        }
    }

    /// Decorator expression nodes attached to a definition, outermost first.
    pub fn decorators<'a>(&self, def: Node<'a>) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        let Some(parent) = def.parent() else {
            return out;
        };
        if parent.kind() != "decorated_definition" {
            return out;
        }
        let mut cursor = parent.walk();
        for child in parent.named_children(&mut cursor) {
            if child.kind() == "decorator" {
                if let Some(expr) = child.named_child(0) {
                    out.push(expr);
                }
            }
        }
        out
    }
}

/// True when a definition carries the `async` keyword.
pub fn is_async_def(node: Node) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "async" {
            return true;
        }
        if child.kind() == "def" || child.kind() == "with" {
            break;
        }
    }
    false
}

/// True when any ancestor of `node` is a class definition.
pub fn in_class(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "class_definition" {
            return true;
        }
        current = n.parent();
    }
    false
}

/// Preorder traversal over a subtree, yielding every node including
/// anonymous tokens.
pub fn preorder(node: Node) -> Preorder<'_> {
    Preorder {
        cursor: node.walk(),
        root_id: node.id(),
        done: false,
    }
}

pub struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    root_id: usize,
    done: bool,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        if !self.cursor.goto_first_child() {
            loop {
                if self.cursor.node().id() == self.root_id {
                    self.done = true;
                    break;
                }
                if self.cursor.goto_next_sibling() {
                    break;
                }
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        PythonParser::new().parse_source(source).unwrap()
    }

    #[test]
    fn test_parse_valid_source() {
        let parsed = parse("def f():\n    pass\n");
        assert_eq!(parsed.root_node().kind(), "module");
    }

    #[test]
    fn test_parse_invalid_source_is_unparseable() {
        let result = PythonParser::new().parse_source("def f(:\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_preorder_visits_whole_tree() {
        let parsed = parse("x = 1\ny = 2\n");
        let kinds: Vec<&str> = preorder(parsed.root_node()).map(|n| n.kind()).collect();
        assert_eq!(kinds[0], "module");
        assert_eq!(
            kinds.iter().filter(|k| **k == "assignment").count(),
            2
        );
    }

    #[test]
    fn test_preorder_stays_in_subtree() {
        let parsed = parse("def f():\n    a()\n\ndef g():\n    b()\n");
        let root = parsed.root_node();
        let first_def = root.named_child(0).unwrap();
        let calls: Vec<String> = preorder(first_def)
            .filter(|n| n.kind() == "call")
            .filter_map(|c| parsed.simple_call_name(c).map(str::to_string))
            .collect();
        assert_eq!(calls, vec!["a"]);
    }

    #[test]
    fn test_parameters_with_annotations() {
        let parsed = parse("def f(x: int, y, z: str = \"a\", *args, **kw):\n    pass\n");
        let def = parsed.root_node().named_child(0).unwrap();
        let params = parsed.parameters(def);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "x");
        assert_eq!(params[0].annotation.as_deref(), Some("int"));
        assert_eq!(params[1].name, "y");
        assert_eq!(params[1].annotation, None);
        assert_eq!(params[2].name, "z");
        assert_eq!(params[2].annotation.as_deref(), Some("str"));
    }

    #[test]
    fn test_return_type() {
        let parsed = parse("def f() -> str:\n    pass\n");
        let def = parsed.root_node().named_child(0).unwrap();
        assert_eq!(parsed.return_type(def), Some("str"));
    }

    #[test]
    fn test_return_type_ignores_complex_annotations() {
        let parsed = parse("def f() -> dict[str, int]:\n    pass\n");
        let def = parsed.root_node().named_child(0).unwrap();
        assert_eq!(parsed.return_type(def), None);
    }

    #[test]
    fn test_simple_call_name() {
        let parsed = parse("f(1)\nobj.m(2)\n");
        let calls: Vec<_> = preorder(parsed.root_node())
            .filter(|n| n.kind() == "call")
            .collect();
        assert_eq!(parsed.simple_call_name(calls[0]), Some("f"));
        assert_eq!(parsed.simple_call_name(calls[1]), None);
        assert_eq!(parsed.call_name(calls[1]), Some("m"));
    }

    #[test]
    fn test_string_value() {
        let parsed = parse("x = \"DB_URL\"\n");
        let string = preorder(parsed.root_node())
            .find(|n| n.kind() == "string")
            .unwrap();
        assert_eq!(parsed.string_value(string).as_deref(), Some("DB_URL"));
    }

    #[test]
    fn test_is_async_def() {
        let parsed = parse("async def f():\n    pass\n\ndef g():\n    pass\n");
        let root = parsed.root_node();
        assert!(is_async_def(root.named_child(0).unwrap()));
        assert!(!is_async_def(root.named_child(1).unwrap()));
    }

    #[test]
    fn test_in_class() {
        let parsed = parse("class C:\n    def m(self):\n        pass\n\ndef f():\n    pass\n");
        let defs: Vec<_> = preorder(parsed.root_node())
            .filter(|n| n.kind() == "function_definition")
            .collect();
        assert!(in_class(defs[0]));
        assert!(!in_class(defs[1]));
    }

    #[test]
    fn test_decorators() {
        let parsed = parse("@cached\n@app.route\ndef f():\n    pass\n");
        let def = preorder(parsed.root_node())
            .find(|n| n.kind() == "function_definition")
            .unwrap();
        let decos = parsed.decorators(def);
        assert_eq!(decos.len(), 2);
        assert_eq!(parsed.identifier(decos[0]), Some("cached"));
        assert_eq!(decos[1].kind(), "attribute");
    }
}
