//! Frequency variant: per-term document counts plus the secondary document index.
//!
//! While the term-oriented reduce runs on the rayon pool, a scoped thread folds the same
//! sorted block associations into per-document term counts and appends them to
//! `doc_index.<ext>`. The block is complete only once that thread has been joined.

use crate::bsbi::{group_by_term, shuffle_sort, IndexVariant};
use crate::collection::Document;
use crate::error::Result;
use crate::index::{DocId, Encoding, FrequencyMap, IndexKind, PartialIndex, TermId};
use crate::persist::{self, IndexPaths};
use crate::registry::IdRegistry;
use rayon::prelude::*;
use std::path::Path;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyIndexer;

impl IndexVariant for FrequencyIndexer {
    type Posting = FrequencyMap;

    const KIND: IndexKind = IndexKind::Frequency;

    fn map(&self, registry: &IdRegistry, document: &Document) -> Vec<(TermId, DocId)> {
        let doc_id = registry.document_id(&document.name);
        document
            .tokens
            .iter()
            .map(|token| (registry.term_id(token), doc_id))
            .collect()
    }

    fn invert_block(&self, pairs: Vec<(TermId, DocId)>, paths: &IndexPaths) -> Result<PartialIndex<FrequencyMap>> {
        let sorted = shuffle_sort(pairs);
        let doc_index = paths.doc_index();
        let encoding = paths.encoding;

        thread::scope(|scope| -> Result<PartialIndex<FrequencyMap>> {
            let writer = scope.spawn(|| append_doc_index(&sorted, &doc_index, encoding));

            let postings: PartialIndex<FrequencyMap> = group_by_term(&sorted)
                .into_par_iter()
                .map(|(term, docs)| (term, reduce(&docs)))
                .collect();

            writer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
            Ok(postings)
        })
    }
}

/// Count repetitions of each document id among one term's associations.
pub fn reduce(docs: &[DocId]) -> FrequencyMap {
    let mut counts = FrequencyMap::new();
    for &doc in docs {
        *counts.entry(doc).or_insert(0) += 1;
    }
    counts
}

/// Per-document term counts of one block, keyed by document id.
pub fn document_vectors(pairs: &[(TermId, DocId)]) -> PartialIndex<FrequencyMap> {
    let mut vectors = PartialIndex::<FrequencyMap>::new();
    for &(term, doc) in pairs {
        *vectors.entry(doc).or_default().entry(term).or_insert(0) += 1;
    }
    vectors
}

fn append_doc_index(pairs: &[(TermId, DocId)], path: &Path, encoding: Encoding) -> Result<()> {
    let vectors = document_vectors(pairs);
    debug!(documents = vectors.len(), path = %path.display(), "appending secondary index records");
    persist::write_records(path, encoding, &vectors, true)
}
