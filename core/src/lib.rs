//! Block-sort-based inverted indexing with boolean and vector-space retrieval.
//!
//! Construction goes through [`bsbi::Bsbi`], generic over an [`bsbi::IndexVariant`]
//! ([`presence::PresenceIndexer`] or [`frequency::FrequencyIndexer`]). The resulting
//! index directory is read back by [`reader`] and queried by [`boolean`] and [`vector`].

pub mod boolean;
pub mod bsbi;
pub mod collection;
pub mod config;
pub mod error;
pub mod frequency;
pub mod index;
pub mod persist;
pub mod postings;
pub mod presence;
pub mod query_file;
pub mod reader;
pub mod registry;
pub mod tokenizer;
pub mod vbe;
pub mod vector;
pub mod weighting;

pub use error::{Error, Result};
pub use index::{DocId, Encoding, FrequencyMap, IndexKind, PartialIndex, PresenceList, TermId};
