use crate::bsbi::{group_by_term, shuffle_sort, IndexVariant};
use crate::collection::Document;
use crate::error::Result;
use crate::index::{DocId, IndexKind, PartialIndex, PresenceList, TermId};
use crate::persist::IndexPaths;
use crate::registry::IdRegistry;
use rayon::prelude::*;

/// Records which documents contain each term.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceIndexer;

impl IndexVariant for PresenceIndexer {
    type Posting = PresenceList;

    const KIND: IndexKind = IndexKind::Presence;

    fn map(&self, registry: &IdRegistry, document: &Document) -> Vec<(TermId, DocId)> {
        let doc_id = registry.document_id(&document.name);
        let mut pairs: Vec<_> = document
            .tokens
            .iter()
            .map(|token| (registry.term_id(token), doc_id))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn invert_block(&self, pairs: Vec<(TermId, DocId)>, _paths: &IndexPaths) -> Result<PartialIndex<PresenceList>> {
        let sorted = shuffle_sort(pairs);
        Ok(group_by_term(&sorted)
            .into_par_iter()
            .map(|(term, docs)| (term, reduce(docs)))
            .collect())
    }
}

/// Sorted, duplicate-free document ids of one term.
pub fn reduce(mut docs: Vec<DocId>) -> PresenceList {
    docs.sort_unstable();
    docs.dedup();
    docs
}
