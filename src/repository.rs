//! Element storage.
//!
//! Analyzers accumulate facts by fetching an element by name, mutating the
//! copy, and saving it back. `save` is an unconditional upsert; no delete
//! exists and the repository lives for exactly one coordinator run.
//!
//! Storage is keyed by the element's qualified key (source file + name) so
//! same-named elements in different files both survive. Name lookup goes
//! through a secondary index with last-write-wins semantics, which preserves
//! the observable enrichment behavior of name-keyed storage.

use std::collections::{BTreeMap, HashMap};

use crate::model::CodeElement;

/// Storage abstraction so the in-memory store can be swapped out later.
pub trait ElementRepository {
    /// Upsert. Replaces any prior record under the same qualified key and
    /// repoints the name index at this record.
    fn save(&mut self, element: CodeElement);

    /// Returns a copy of the record most recently saved under `name`.
    fn find_by_name(&self, name: &str) -> Option<CodeElement>;

    /// Snapshot of all current records. Order is deterministic but otherwise
    /// meaningless; the serializer imposes its own ordering.
    fn all_elements(&self) -> Vec<CodeElement>;
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: BTreeMap<String, CodeElement>,
    by_name: HashMap<String, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl ElementRepository for InMemoryRepository {
    fn save(&mut self, element: CodeElement) {
        let key = element.storage_key();
        self.by_name.insert(element.name.clone(), key.clone());
        self.store.insert(key, element);
    }

    fn find_by_name(&self, name: &str) -> Option<CodeElement> {
        self.by_name
            .get(name)
            .and_then(|key| self.store.get(key))
            .cloned()
    }

    fn all_elements(&self) -> Vec<CodeElement> {
        self.store.values().cloned().collect()
    }
}
