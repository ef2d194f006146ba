//! Block-sort-based index construction.
//!
//! One run goes `prepare -> (parse, invert, persist) per block -> merge -> dictionaries`.
//! Blocks are processed one after the other; within a block documents are mapped and
//! terms reduced on the rayon pool. The postings variant plugs in through
//! [`IndexVariant`].

use crate::collection::{Collection, Document};
use crate::error::{Error, Result};
use crate::index::{DocId, Encoding, IndexKind, PartialIndex, TermId};
use crate::persist::{self, IndexPaths, MetaFile};
use crate::postings::Posting;
use crate::registry::IdRegistry;
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// The per-variant half of the map/shuffle/reduce pipeline.
pub trait IndexVariant: Sync {
    type Posting: Posting;

    const KIND: IndexKind;

    /// Emit the (term id, document id) associations of one document.
    fn map(&self, registry: &IdRegistry, document: &Document) -> Vec<(TermId, DocId)>;

    /// Group a block's associations by term and reduce each group to a posting.
    fn invert_block(&self, pairs: Vec<(TermId, DocId)>, paths: &IndexPaths) -> Result<PartialIndex<Self::Posting>>;
}

/// Sort associations by term id, then document id.
pub fn shuffle_sort(mut pairs: Vec<(TermId, DocId)>) -> Vec<(TermId, DocId)> {
    pairs.par_sort_unstable();
    pairs
}

/// Group sorted associations into one document list per term id.
pub fn group_by_term(sorted: &[(TermId, DocId)]) -> Vec<(TermId, Vec<DocId>)> {
    sorted
        .chunk_by(|a, b| a.0 == b.0)
        .map(|run| (run[0].0, run.iter().map(|&(_, doc)| doc).collect()))
        .collect()
}

pub struct Bsbi<V> {
    variant: V,
    paths: IndexPaths,
    tokenizer: Tokenizer,
}

impl<V: IndexVariant> Bsbi<V> {
    pub fn new<P: AsRef<Path>>(variant: V, root: P, encoding: Encoding) -> Self {
        Self {
            variant,
            paths: IndexPaths::new(root, encoding),
            tokenizer: Tokenizer::default(),
        }
    }

    /// The tokenizer the collection was analyzed with. Its settings go to `meta.json`, and
    /// its own stop-word list, if any, is saved with the index.
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Build the index from scratch, replacing whatever the output directory held.
    pub fn construct(&self, collection: &dyn Collection) -> Result<MetaFile> {
        let blocks = collection.blocks()?;
        let mut unique = HashSet::new();
        if let Some(dup) = blocks.iter().find(|b| !unique.insert(b.as_str())) {
            return Err(Error::format("collection", format!("block `{dup}` is listed twice")));
        }

        persist::prepare_output_dir(&self.paths)?;
        info!(kind = %V::KIND, encoding = %self.paths.encoding, blocks = blocks.len(), root = %self.paths.root.display(), "starting construction");

        let registry = IdRegistry::new();
        for block in &blocks {
            self.process_block(collection, &registry, block)
                .map_err(|e| e.in_block(block))?;
        }

        let terms = self.merge_blocks(&blocks)?;
        info!(terms, "merged blocks");

        let (term_dict, doc_dict) = registry.into_dictionaries();
        persist::save_dictionary(&self.paths.documents(), &doc_dict)?;
        persist::save_dictionary(&self.paths.terms(), &term_dict)?;
        if let Some(words) = self.tokenizer.custom_stop_words() {
            persist::save_stop_words(&self.paths.stop_words(), words)?;
        }

        let meta = MetaFile::new(
            V::KIND,
            self.paths.encoding,
            doc_dict.len() as u32,
            term_dict.len() as u32,
            &self.tokenizer,
        );
        persist::save_meta(&self.paths, &meta)?;
        info!(num_docs = meta.num_docs, num_terms = meta.num_terms, "construction complete");
        Ok(meta)
    }

    fn process_block(&self, collection: &dyn Collection, registry: &IdRegistry, block: &str) -> Result<()> {
        let pairs = self.parse_block(collection, registry, block)?;
        let pair_count = pairs.len();
        let postings = self.variant.invert_block(pairs, &self.paths)?;
        info!(block, pairs = pair_count, terms = postings.len(), "inverted block");
        self.write_block(&postings, block)
    }

    /// Load a block and map its documents in parallel.
    pub fn parse_block(&self, collection: &dyn Collection, registry: &IdRegistry, block: &str) -> Result<Vec<(TermId, DocId)>> {
        let documents = collection.load_block(block)?;
        debug!(block, documents = documents.len(), "loaded block");
        Ok(documents
            .par_iter()
            .flat_map_iter(|doc| self.variant.map(registry, doc))
            .collect())
    }

    fn write_block(&self, postings: &PartialIndex<V::Posting>, block: &str) -> Result<()> {
        persist::write_records(&self.paths.block(block), self.paths.encoding, postings, false)
    }

    /// Merge every block file into the final index in memory, deleting block files as they are read.
    fn merge_blocks(&self, blocks: &[String]) -> Result<usize> {
        let mut merged: PartialIndex<V::Posting> = PartialIndex::new();
        for block in blocks {
            let path = self.paths.block(block);
            let partial = persist::load_records::<V::Posting>(&path, self.paths.encoding)?;
            for (term, posting) in partial {
                match merged.get_mut(&term) {
                    Some(existing) => existing.merge(posting),
                    None => {
                        merged.insert(term, posting);
                    }
                }
            }
            fs::remove_file(&path)?;
        }
        persist::write_records(&self.paths.index(), self.paths.encoding, &merged, false)?;
        fs::remove_dir(self.paths.blocks_dir())?;
        Ok(merged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_by_term_keeps_multiplicity() {
        let sorted = shuffle_sort(vec![(2, 0), (0, 1), (2, 0), (0, 0), (1, 3)]);
        assert_eq!(sorted, vec![(0, 0), (0, 1), (1, 3), (2, 0), (2, 0)]);
        assert_eq!(
            group_by_term(&sorted),
            vec![(0, vec![0, 1]), (1, vec![3]), (2, vec![0, 0])]
        );
    }

    #[test]
    fn group_by_term_of_nothing_is_empty() {
        assert!(group_by_term(&[]).is_empty());
    }
}
