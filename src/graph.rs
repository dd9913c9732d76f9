//! The knowledge-graph document and its persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::model::CodeElement;

/// Per-file variable assignment dependencies: target name -> names read on
/// the right-hand side.
pub type DataFlows = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// One third-party package and the files that import it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDependency {
    pub package: String,
    /// Installed version, or null when it could not be resolved.
    pub version: Option<String>,
    pub used_by: Vec<String>,
}

/// Final artifact of one coordinator run. All embedded file paths are
/// relative to `root`, the single absolute path in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub files: Vec<String>,
    pub elements: Vec<CodeElement>,
    pub data_flows: DataFlows,
    pub external_dependencies: Vec<ExternalDependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_metadata: Option<serde_json::Value>,
    pub analysis_id: Uuid,
    pub root: String,
}

/// Writes the graph as pretty-printed JSON, always overwriting in full.
pub struct GraphWriter {
    path: PathBuf,
}

impl GraphWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default destination: `knowledge_graph.json` next to the executable,
    /// falling back to the current directory.
    pub fn default_location() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join("knowledge_graph.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, graph: &KnowledgeGraph) -> Result<()> {
        let json = serde_json::to_string_pretty(graph)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "knowledge graph written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<KnowledgeGraph> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
