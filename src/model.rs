//! Element model for the knowledge graph.
//!
//! Every discovered fact is a [`CodeElement`]: a name, a kind tag with its
//! variant-specific fields, a dependency set, and a bag of optional typed
//! metadata. Dependencies are plain string references to other element names
//! or to synthetic tagged edges such as `RAISES::ValueError`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Variant tag plus the fields that only exist for that variant.
///
/// Serialized flattened into the element with a `"type"` tag, so the JSON
/// shape matches `{"type": "CLASS", "methods": [...], ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    #[serde(rename = "CLASS")]
    Class {
        methods: Vec<String>,
        superclass: Option<String>,
    },
    #[serde(rename = "FUNCTION")]
    Function { parameters: Vec<String> },
    #[serde(rename = "MODULE")]
    Module,
    #[serde(rename = "PACKAGE")]
    Package,
    #[serde(rename = "VARIABLE")]
    Variable,
    #[serde(rename = "CONFIG_KEY")]
    ConfigKey,
    #[serde(rename = "DECORATOR")]
    Decorator,
    #[serde(rename = "EXTERNAL_LIB")]
    ExternalLib,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Fixed set of optional facts the analyzer passes can attach to an element.
///
/// A closed struct rather than an open string-keyed map: the JSON shape is
/// the same (unset fields are absent) and the fact names stay statically
/// checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMetadata {
    /// Originating file, relative to the analysis root. Always set on modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(rename = "async", default, skip_serializing_if = "is_false")]
    pub is_async: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub param_types: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,

    /// Tally of control-flow construct names seen in the module.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_structures: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctor_params: Vec<String>,

    /// Instance attribute names assigned in a constructor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_attributes: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub dynamic_attrs: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub dynamic_code: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub entry_point: bool,
}

/// One discovered code fact, keyed in the repository by a qualified key
/// (`source::name`) with a name-based secondary lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeElement {
    /// Opaque unique id assigned at creation. Never used for lookup.
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub dependencies: BTreeSet<String>,
    #[serde(default)]
    pub metadata: ElementMetadata,
    /// Root-relative originating file. Part of the storage key, not of the
    /// serialized snapshot.
    #[serde(skip)]
    pub source: Option<String>,
}

impl CodeElement {
    fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            dependencies: BTreeSet::new(),
            metadata: ElementMetadata::default(),
            source: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ElementKind::Class {
                methods: Vec::new(),
                superclass: None,
            },
        )
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ElementKind::Function {
                parameters: Vec::new(),
            },
        )
    }

    pub fn module(name: impl Into<String>, file: impl Into<String>) -> Self {
        let mut elt = Self::new(name, ElementKind::Module);
        elt.metadata.file = Some(file.into());
        elt
    }

    pub fn package(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Package)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Variable)
    }

    pub fn config_key(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::ConfigKey)
    }

    pub fn decorator(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Decorator)
    }

    pub fn external_lib(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::ExternalLib)
    }

    pub fn with_source(mut self, rel: impl Into<String>) -> Self {
        self.source = Some(rel.into());
        self
    }

    /// Key the repository stores the element under. Elements that originate
    /// from a file are qualified by it so same-named elements in different
    /// files do not overwrite each other.
    pub fn storage_key(&self) -> String {
        match &self.source {
            Some(src) => format!("{}::{}", src, self.name),
            None => self.name.clone(),
        }
    }

    /// Records an edge to another element name or tagged reference.
    /// Empty strings and self-references are dropped.
    pub fn add_dependency(&mut self, dep: &str) {
        if !dep.is_empty() && dep != self.name {
            self.dependencies.insert(dep.to_string());
        }
    }

    /// First recognized base becomes the superclass; every base is an edge.
    pub fn set_superclass(&mut self, base: &str) {
        if let ElementKind::Class { superclass, .. } = &mut self.kind {
            if superclass.is_none() {
                *superclass = Some(base.to_string());
            }
        }
        self.add_dependency(base);
    }

    pub fn add_method(&mut self, method: &str) {
        if let ElementKind::Class { methods, .. } = &mut self.kind {
            methods.push(method.to_string());
        }
    }

    pub fn add_parameter(&mut self, param: &str) {
        if let ElementKind::Function { parameters } = &mut self.kind {
            parameters.push(param.to_string());
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, ElementKind::Class { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ElementKind::Function { .. })
    }

    pub fn is_module(&self) -> bool {
        matches!(self.kind, ElementKind::Module)
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            ElementKind::Class { .. } => "CLASS",
            ElementKind::Function { .. } => "FUNCTION",
            ElementKind::Module => "MODULE",
            ElementKind::Package => "PACKAGE",
            ElementKind::Variable => "VARIABLE",
            ElementKind::ConfigKey => "CONFIG_KEY",
            ElementKind::Decorator => "DECORATOR",
            ElementKind::ExternalLib => "EXTERNAL_LIB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_dependency_skips_self_and_empty() {
        let mut elt = CodeElement::function("f");
        elt.add_dependency("f");
        elt.add_dependency("");
        elt.add_dependency("g");
        elt.add_dependency("g");
        assert_eq!(elt.dependencies.len(), 1);
        assert!(elt.dependencies.contains("g"));
    }

    #[test]
    fn test_first_superclass_wins() {
        let mut elt = CodeElement::class("B");
        elt.set_superclass("A");
        elt.set_superclass("Mixin");
        match &elt.kind {
            ElementKind::Class { superclass, .. } => {
                assert_eq!(superclass.as_deref(), Some("A"));
            }
            _ => panic!("expected class"),
        }
        assert!(elt.dependencies.contains("A"));
        assert!(elt.dependencies.contains("Mixin"));
    }

    #[test]
    fn test_storage_key_qualified_by_source() {
        let elt = CodeElement::function("f").with_source("pkg/mod.py");
        assert_eq!(elt.storage_key(), "pkg/mod.py::f");

        let pkg = CodeElement::package("pkg");
        assert_eq!(pkg.storage_key(), "pkg");
    }

    #[test]
    fn test_serialized_shape() {
        let mut elt = CodeElement::class("B");
        elt.set_superclass("A");
        elt.add_method("run");
        elt.metadata.ctor_params.push("y".to_string());

        let json = serde_json::to_value(&elt).unwrap();
        assert_eq!(json["type"], "CLASS");
        assert_eq!(json["name"], "B");
        assert_eq!(json["superclass"], "A");
        assert_eq!(json["methods"][0], "run");
        assert_eq!(json["dependencies"][0], "A");
        assert_eq!(json["metadata"]["ctor_params"][0], "y");
        // unset facts are absent, not null
        assert!(json["metadata"].get("async").is_none());
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_metadata_flags_absent_until_set() {
        let mut elt = CodeElement::module("m", "m.py");
        let json = serde_json::to_value(&elt).unwrap();
        assert!(json["metadata"].get("entry_point").is_none());

        elt.metadata.entry_point = true;
        let json = serde_json::to_value(&elt).unwrap();
        assert_eq!(json["metadata"]["entry_point"], true);
    }

    #[test]
    fn test_roundtrip() {
        let mut elt = CodeElement::function("f");
        elt.add_parameter("x");
        elt.add_dependency("g");
        elt.metadata
            .param_types
            .insert("x".to_string(), "int".to_string());

        let json = serde_json::to_string(&elt).unwrap();
        let back: CodeElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, elt.name);
        assert_eq!(back.kind, elt.kind);
        assert_eq!(back.dependencies, elt.dependencies);
        assert_eq!(back.metadata, elt.metadata);
    }
}
