//! Compile-time defaults shared by the indexer, the query front-ends and the server.
//!
//! Runtime settings (collection and index locations, stop-word file, bind address)
//! come from CLI arguments and their environment-variable fallbacks in each binary.

/// Number of ranked documents returned by the vector-space engine.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Version written to `meta.json`; bumped whenever the on-disk layout changes.
pub const META_VERSION: u32 = 2;

pub const TERMS_FILE: &str = "terms.txt";
pub const DOCUMENTS_FILE: &str = "documents.txt";
pub const META_FILE: &str = "meta.json";
pub const BLOCKS_DIR: &str = "blocks";
/// Stop words of an index built with its own list, one per line.
pub const STOP_WORDS_FILE: &str = "stop_words.txt";

/// Base names of the final index and of the secondary document index.
pub const INDEX_NAME: &str = "index";
pub const DOC_INDEX_NAME: &str = "doc_index";

pub const PLAIN_EXTENSION: &str = "txt";
pub const VBE_EXTENSION: &str = "vbe";
