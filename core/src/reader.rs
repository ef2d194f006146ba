//! Read side of an index directory.
//!
//! Dictionary lookups scan the sorted dictionary files; postings lookups walk the record
//! stream header by header and only decode the bodies they were asked for.

use crate::error::{Error, Result};
use crate::index::{DocId, Encoding, FrequencyMap, IndexKind, PartialIndex, PresenceList, TermId};
use crate::persist::{self, IndexPaths, MetaFile};
use crate::postings::{Posting, RecordReader};
use crate::tokenizer::Tokenizer;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

/// Dictionary-level access shared by both postings variants.
#[derive(Debug, Clone)]
pub struct IndexReader {
    paths: IndexPaths,
    meta: MetaFile,
    tokenizer: Tokenizer,
}

impl IndexReader {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let meta = persist::load_meta(root)?;
        let paths = IndexPaths::new(root, meta.encoding);
        let mut tokenizer = Tokenizer::new(meta.tokenizer);
        if meta.custom_stop_words {
            tokenizer = tokenizer.with_stop_words(persist::load_stop_words(&paths.stop_words())?);
        }
        debug!(kind = %meta.kind, encoding = %meta.encoding, root = %root.display(), "opened index");
        Ok(Self { paths, meta, tokenizer })
    }

    pub fn meta(&self) -> &MetaFile {
        &self.meta
    }

    pub fn kind(&self) -> IndexKind {
        self.meta.kind
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// A tokenizer configured the way the collection was analyzed.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Id of `term`, or `None` when the term is not in the dictionary.
    pub fn term_id(&self, term: &str) -> Result<Option<TermId>> {
        let mut found = None;
        persist::scan_dictionary(&self.paths.terms(), |key, id| {
            if key == term {
                found = Some(id);
            }
            key < term
        })?;
        Ok(found)
    }

    /// Resolve several terms in one dictionary pass. Unknown terms are left out.
    pub fn term_ids(&self, terms: &[String]) -> Result<HashMap<String, TermId>> {
        let mut found = HashMap::with_capacity(terms.len());
        persist::scan_dictionary(&self.paths.terms(), |key, id| {
            if terms.iter().any(|t| t == key) {
                found.insert(key.to_string(), id);
            }
            found.len() < terms.len()
        })?;
        Ok(found)
    }

    /// Size of the document dictionary.
    pub fn num_documents(&self) -> Result<u32> {
        let mut count = 0u32;
        persist::scan_dictionary(&self.paths.documents(), |_, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    /// Every document id of the collection.
    pub fn all_documents(&self) -> Result<BTreeSet<DocId>> {
        Ok((0..self.num_documents()?).collect())
    }

    /// Names of `ids`, in the order they were requested.
    pub fn document_names(&self, ids: &[DocId]) -> Result<Vec<String>> {
        let wanted: BTreeSet<DocId> = ids.iter().copied().collect();
        let mut names: HashMap<DocId, String> = HashMap::with_capacity(wanted.len());
        persist::scan_dictionary(&self.paths.documents(), |name, id| {
            if wanted.contains(&id) {
                names.insert(id, name.to_string());
            }
            names.len() < wanted.len()
        })?;
        ids.iter()
            .map(|id| {
                names
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::integrity(format!("document id {id} is not in the document dictionary")))
            })
            .collect()
    }

    fn require(&self, kind: IndexKind, operation: &'static str) -> Result<()> {
        if self.meta.kind == kind {
            Ok(())
        } else {
            Err(Error::Unsupported {
                operation,
                found: self.meta.kind,
            })
        }
    }
}

/// Fetch the records keyed by `wanted` from a record file.
///
/// With `unique_keys` the scan stops past the largest wanted key; otherwise the whole file
/// is read and repeated keys are merged. Wanted keys without a record are an integrity error.
fn fetch_records<P: Posting>(
    path: &Path,
    encoding: Encoding,
    wanted: &BTreeSet<u32>,
    unique_keys: bool,
    what: &str,
) -> Result<PartialIndex<P>> {
    let mut found = PartialIndex::<P>::new();
    let Some(&last) = wanted.last() else {
        return Ok(found);
    };
    let mut reader = RecordReader::<P>::open(path, encoding)?;
    while let Some(header) = reader.next_header()? {
        if unique_keys && header.key > last {
            break;
        }
        if !wanted.contains(&header.key) {
            continue;
        }
        let body = reader.read_body()?;
        match found.get_mut(&header.key) {
            Some(existing) => existing.merge(body),
            None => {
                found.insert(header.key, body);
            }
        }
    }
    if let Some(missing) = wanted.iter().find(|key| !found.contains_key(*key)) {
        return Err(Error::integrity(format!("{what} {missing} has no record in {}", path.display())));
    }
    Ok(found)
}

/// Reader over a presence index.
#[derive(Debug, Clone)]
pub struct PresenceReader {
    index: IndexReader,
}

impl PresenceReader {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::from_index(IndexReader::open(root)?)
    }

    pub fn from_index(index: IndexReader) -> Result<Self> {
        index.require(IndexKind::Presence, "boolean retrieval")?;
        Ok(Self { index })
    }

    pub fn index(&self) -> &IndexReader {
        &self.index
    }

    /// Postings of a term id known to the dictionary.
    pub fn related_documents(&self, term_id: TermId) -> Result<PresenceList> {
        let paths = &self.index.paths;
        let mut records = fetch_records::<PresenceList>(&paths.index(), paths.encoding, &BTreeSet::from([term_id]), true, "term id")?;
        Ok(records.remove(&term_id).unwrap_or_default())
    }

    /// Documents containing `term`; empty when the term is not in the dictionary.
    pub fn find_documents(&self, term: &str) -> Result<BTreeSet<DocId>> {
        match self.index.term_id(term)? {
            Some(id) => Ok(self.related_documents(id)?.into_iter().collect()),
            None => Ok(BTreeSet::new()),
        }
    }
}

/// Reader over a frequency index and its secondary document index.
#[derive(Debug, Clone)]
pub struct FrequencyReader {
    index: IndexReader,
}

impl FrequencyReader {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::from_index(IndexReader::open(root)?)
    }

    pub fn from_index(index: IndexReader) -> Result<Self> {
        index.require(IndexKind::Frequency, "vector retrieval")?;
        Ok(Self { index })
    }

    pub fn index(&self) -> &IndexReader {
        &self.index
    }

    /// Postings of every term id in `term_ids`, keyed by term id.
    pub fn related_postings(&self, term_ids: &[TermId]) -> Result<PartialIndex<FrequencyMap>> {
        let paths = &self.index.paths;
        let wanted = term_ids.iter().copied().collect();
        fetch_records(&paths.index(), paths.encoding, &wanted, true, "term id")
    }

    /// Term-frequency vectors of `doc_ids`, keyed by document id.
    pub fn related_terms(&self, doc_ids: &[DocId]) -> Result<PartialIndex<FrequencyMap>> {
        let paths = &self.index.paths;
        let wanted = doc_ids.iter().copied().collect();
        fetch_records(&paths.doc_index(), paths.encoding, &wanted, false, "document id")
    }

    /// Postings of the dictionary terms among `terms`, keyed by term.
    pub fn find_postings(&self, terms: &[String]) -> Result<HashMap<String, FrequencyMap>> {
        let ids = self.index.term_ids(terms)?;
        let id_list: Vec<TermId> = ids.values().copied().collect();
        let mut postings = self.related_postings(&id_list)?;
        Ok(ids
            .into_iter()
            .filter_map(|(term, id)| postings.remove(&id).map(|p| (term, p)))
            .collect())
    }

    /// Document frequency of every indexed term, from record headers alone.
    pub fn doc_freqs(&self) -> Result<BTreeMap<TermId, u32>> {
        let paths = &self.index.paths;
        let mut reader = RecordReader::<FrequencyMap>::open(&paths.index(), paths.encoding)?;
        let mut freqs = BTreeMap::new();
        while let Some(header) = reader.next_header()? {
            freqs.insert(header.key, header.count as u32);
        }
        Ok(freqs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsbi::Bsbi;
    use crate::collection::MemoryCollection;
    use crate::frequency::FrequencyIndexer;
    use crate::presence::PresenceIndexer;

    fn animals() -> MemoryCollection {
        MemoryCollection::new()
            .with_block("b0", [("d0", "cat dog")])
            .with_block("b1", [("d1", "dog")])
            .with_block("b2", [("d2", "cat cat bird")])
    }

    #[test]
    fn presence_lookups() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Vbe)
            .construct(&animals())
            .unwrap();
        let reader = PresenceReader::open(dir.path()).unwrap();

        let cat = reader.find_documents("cat").unwrap();
        let names = reader.index().document_names(&cat.into_iter().collect::<Vec<_>>()).unwrap();
        assert_eq!(names, vec!["d0", "d2"]);
        assert!(reader.find_documents("zebra").unwrap().is_empty());
        assert_eq!(reader.index().all_documents().unwrap().len(), 3);
        assert_eq!(reader.index().term_id("zebra").unwrap(), None);
    }

    #[test]
    fn names_keep_requested_order() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Plain)
            .construct(&animals())
            .unwrap();
        let index = IndexReader::open(dir.path()).unwrap();
        assert_eq!(index.document_names(&[2, 0]).unwrap(), vec!["d2", "d0"]);
        assert!(matches!(index.document_names(&[7]), Err(Error::Integrity(_))));
    }

    #[test]
    fn frequency_lookups() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(FrequencyIndexer, dir.path(), Encoding::Plain)
            .construct(&animals())
            .unwrap();
        let reader = FrequencyReader::open(dir.path()).unwrap();
        let index = reader.index();

        let postings = reader.find_postings(&["cat".into(), "unknown".into()]).unwrap();
        assert_eq!(postings.len(), 1);
        let d2 = index.document_names(&[2]).unwrap();
        assert_eq!(d2, vec!["d2"]);
        assert_eq!(postings["cat"].values().copied().collect::<Vec<_>>(), vec![1, 2]);

        let cat = index.term_id("cat").unwrap().unwrap();
        assert_eq!(reader.doc_freqs().unwrap()[&cat], 2);

        let vectors = reader.related_terms(&[2]).unwrap();
        assert_eq!(vectors[&2][&cat], 2);
        assert!(matches!(reader.related_terms(&[9]), Err(Error::Integrity(_))));
    }

    #[test]
    fn missing_postings_are_an_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Plain)
            .construct(&animals())
            .unwrap();
        let reader = PresenceReader::open(dir.path()).unwrap();
        assert!(matches!(reader.related_documents(99), Err(Error::Integrity(_))));
    }

    #[test]
    fn engines_refuse_the_wrong_index_kind() {
        let dir = tempfile::tempdir().unwrap();
        Bsbi::new(PresenceIndexer, dir.path(), Encoding::Plain)
            .construct(&animals())
            .unwrap();
        assert!(matches!(
            FrequencyReader::open(dir.path()),
            Err(Error::Unsupported { found: IndexKind::Presence, .. })
        ));
    }
}
