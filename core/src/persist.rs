use crate::config::{
    BLOCKS_DIR, DOCUMENTS_FILE, DOC_INDEX_NAME, INDEX_NAME, META_FILE, META_VERSION, STOP_WORDS_FILE,
    TERMS_FILE,
};
use crate::error::{Error, Result};
use crate::index::{Encoding, IndexKind, PartialIndex};
use crate::postings::{Posting, RecordReader};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{self, create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub kind: IndexKind,
    pub encoding: Encoding,
    pub num_docs: u32,
    pub num_terms: u32,
    pub tokenizer: TokenizerConfig,
    /// Set when the collection was filtered with its own list, saved next to the dictionaries.
    #[serde(default)]
    pub custom_stop_words: bool,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn new(kind: IndexKind, encoding: Encoding, num_docs: u32, num_terms: u32, tokenizer: &Tokenizer) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            kind,
            encoding,
            num_docs,
            num_terms,
            tokenizer: tokenizer.config(),
            custom_stop_words: tokenizer.custom_stop_words().is_some(),
            created_at,
            version: META_VERSION,
        }
    }
}

/// File layout of one index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
    pub encoding: Encoding,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P, encoding: Encoding) -> Self {
        Self { root: root.as_ref().to_path_buf(), encoding }
    }
    pub fn terms(&self) -> PathBuf { self.root.join(TERMS_FILE) }
    pub fn documents(&self) -> PathBuf { self.root.join(DOCUMENTS_FILE) }
    pub fn meta(&self) -> PathBuf { self.root.join(META_FILE) }
    pub fn blocks_dir(&self) -> PathBuf { self.root.join(BLOCKS_DIR) }
    pub fn stop_words(&self) -> PathBuf { self.root.join(STOP_WORDS_FILE) }
    pub fn block(&self, name: &str) -> PathBuf {
        self.blocks_dir().join(format!("{name}.{}", self.encoding.extension()))
    }
    pub fn index(&self) -> PathBuf {
        self.root.join(format!("{INDEX_NAME}.{}", self.encoding.extension()))
    }
    pub fn doc_index(&self) -> PathBuf {
        self.root.join(format!("{DOC_INDEX_NAME}.{}", self.encoding.extension()))
    }
}

/// Wipe the index directory and recreate it empty, with its block scratch area.
pub fn prepare_output_dir(paths: &IndexPaths) -> Result<()> {
    if paths.root.exists() {
        fs::remove_dir_all(&paths.root)?;
    }
    create_dir_all(paths.blocks_dir())?;
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(root: &Path) -> Result<MetaFile> {
    let mut f = File::open(root.join(META_FILE))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write `key id` lines sorted by key.
pub fn save_dictionary(path: &Path, dict: &HashMap<String, u32>) -> Result<()> {
    let mut entries: Vec<(&String, &u32)> = dict.iter().collect();
    entries.sort();
    let mut w = BufWriter::new(File::create(path)?);
    for (key, id) in entries {
        writeln!(w, "{key} {id}")?;
    }
    w.flush()?;
    Ok(())
}

/// Scan a dictionary file in order; `visit` returns `false` to stop early.
///
/// Keys may contain spaces (document names), the id is always the last field.
pub fn scan_dictionary(path: &Path, mut visit: impl FnMut(&str, u32) -> bool) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (key, id) = line
            .rsplit_once(' ')
            .and_then(|(key, id)| id.parse::<u32>().ok().map(|id| (key, id)))
            .ok_or_else(|| Error::format(format!("dictionary {}", path.display()), format!("line {}: `{line}`", n + 1)))?;
        if !visit(key, id) {
            break;
        }
    }
    Ok(())
}

pub fn save_stop_words(path: &Path, words: &HashSet<String>) -> Result<()> {
    let mut sorted: Vec<&String> = words.iter().collect();
    sorted.sort();
    let mut w = BufWriter::new(File::create(path)?);
    for word in sorted {
        writeln!(w, "{word}")?;
    }
    w.flush()?;
    Ok(())
}

/// Newline-separated stop words, blank lines dropped.
pub fn load_stop_words(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write records in ascending key order, creating the file or appending to it.
pub fn write_records<P: Posting>(path: &Path, encoding: Encoding, records: &PartialIndex<P>, append: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    let mut w = BufWriter::new(file);
    let mut buf = Vec::new();
    for (&key, posting) in records {
        buf.clear();
        posting.encode_record(key, encoding, &mut buf);
        w.write_all(&buf)?;
    }
    w.flush()?;
    Ok(())
}

/// Load a whole record file; records repeating a key are merged.
pub fn load_records<P: Posting>(path: &Path, encoding: Encoding) -> Result<PartialIndex<P>> {
    let mut reader = RecordReader::<P>::open(path, encoding)?;
    let mut records = PartialIndex::new();
    while let Some((key, posting)) = reader.next_record()? {
        match records.get_mut(&key) {
            Some(existing) => P::merge(existing, posting),
            None => {
                records.insert(key, posting);
            }
        }
    }
    Ok(records)
}
