use crate::index::{DocId, TermId};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Dense id assignment for terms and documents during one construction run.
///
/// Each namespace sits behind its own lock, so document lookups from one worker never
/// wait on term lookups from another. An id is the size of the mapping at the time the
/// key was first seen: ids are dense and never skipped, but under concurrent callers the
/// numbering is not reproducible across runs.
#[derive(Debug, Default)]
pub struct IdRegistry {
    terms: Mutex<HashMap<String, TermId>>,
    documents: Mutex<HashMap<String, DocId>>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term_id(&self, term: &str) -> TermId {
        resolve_or_create(&self.terms, term)
    }

    pub fn document_id(&self, name: &str) -> DocId {
        resolve_or_create(&self.documents, name)
    }

    pub fn num_terms(&self) -> usize {
        self.terms.lock().len()
    }

    pub fn num_documents(&self) -> usize {
        self.documents.lock().len()
    }

    /// Consume the registry, yielding the (terms, documents) dictionaries.
    pub fn into_dictionaries(self) -> (HashMap<String, TermId>, HashMap<String, DocId>) {
        (self.terms.into_inner(), self.documents.into_inner())
    }
}

fn resolve_or_create(map: &Mutex<HashMap<String, u32>>, key: &str) -> u32 {
    let mut map = map.lock();
    if let Some(&id) = map.get(key) {
        return id;
    }
    let id = map.len() as u32;
    map.insert(key.to_string(), id);
    id
}
