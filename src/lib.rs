pub mod analyzer;
pub mod dependencies;
pub mod error;
pub mod graph;
pub mod model;
pub mod python;
pub mod repository;
pub mod server;
pub mod trace;
pub mod walker;

pub use analyzer::{CodeAnalyzer, DataFlowAnalyzer, ExternalDependencyAnalyzer};
pub use error::{GraphError, Result};
pub use graph::{ExternalDependency, GraphWriter, KnowledgeGraph};
pub use model::{CodeElement, ElementKind, ElementMetadata};
pub use repository::{ElementRepository, InMemoryRepository};
pub use walker::SourceWalker;
