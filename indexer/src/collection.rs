//! On-disk collection formats understood by the indexer.

use sift_core::collection::{Collection, Document};
use sift_core::tokenizer::Tokenizer;
use sift_core::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Block holding the regular files found directly under the collection root. Hidden
/// entries are never blocks, so no sub-directory can take this name.
pub const ROOT_BLOCK: &str = ".root";

/// Block name of a tagged single-file collection.
pub const TAGGED_BLOCK: &str = "all";

const TAGGED_MARKERS: [&str; 9] = [".I", ".T", ".W", ".B", ".A", ".N", ".X", ".K", ".C"];
const TAGGED_TEXT: [&str; 3] = [".T", ".W", ".K"];

fn unavailable(path: &Path, reason: impl Into<String>) -> Error {
    Error::CollectionUnavailable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Regular, non-hidden files directly inside `dir`, by file name.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && !is_hidden(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// A directory tree: every sub-directory is a block and every file inside it a document
/// named `<block>_<file>`.
pub struct DirectoryCollection {
    root: PathBuf,
    tokenizer: Tokenizer,
}

impl DirectoryCollection {
    pub fn new<P: AsRef<Path>>(root: P, tokenizer: Tokenizer) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            tokenizer,
        }
    }

    fn block_dir(&self, block: &str) -> PathBuf {
        if block == ROOT_BLOCK {
            self.root.clone()
        } else {
            self.root.join(block)
        }
    }
}

impl Collection for DirectoryCollection {
    fn blocks(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(unavailable(&self.root, "not a directory"));
        }
        let mut blocks = Vec::new();
        let mut loose_files = false;
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| unavailable(&self.root, e.to_string()))?;
            if is_hidden(entry.path()) {
                continue;
            }
            if entry.file_type().is_dir() {
                blocks.push(entry.file_name().to_string_lossy().into_owned());
            } else if entry.file_type().is_file() {
                loose_files = true;
            }
        }
        if loose_files {
            blocks.push(ROOT_BLOCK.to_string());
        }
        Ok(blocks)
    }

    fn load_block(&self, block: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for path in files_in(&self.block_dir(block))? {
            let bytes = fs::read(&path)?;
            let text = String::from_utf8_lossy(&bytes);
            if let std::borrow::Cow::Owned(_) = text {
                tracing::warn!(path = %path.display(), "document is not valid UTF-8, decoded lossily");
            }
            let file = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            documents.push(Document::new(format!("{block}_{file}"), self.tokenizer.tokenize(&text)));
        }
        Ok(documents)
    }
}

/// A single file of `.I <id>` records whose `.T`, `.W` and `.K` sections hold the text.
pub struct TaggedCollection {
    path: PathBuf,
    tokenizer: Tokenizer,
}

impl TaggedCollection {
    pub fn new<P: AsRef<Path>>(path: P, tokenizer: Tokenizer) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tokenizer,
        }
    }
}

/// `(id, text)` of every record of a tagged collection.
pub fn parse_tagged(content: &str) -> Vec<(String, String)> {
    let mut records: Vec<(String, String)> = Vec::new();
    let mut taking = false;
    for line in content.lines() {
        let marker = line.get(..2).filter(|m| TAGGED_MARKERS.contains(m));
        match marker {
            Some(".I") => {
                records.push((line[2..].trim().to_string(), String::new()));
                taking = false;
            }
            Some(marker) => taking = TAGGED_TEXT.contains(&marker),
            None if taking => {
                if let Some((_, text)) = records.last_mut() {
                    text.push_str(line);
                    text.push('\n');
                }
            }
            None => {}
        }
    }
    records
}

impl Collection for TaggedCollection {
    fn blocks(&self) -> Result<Vec<String>> {
        if !self.path.is_file() {
            return Err(unavailable(&self.path, "not a file"));
        }
        Ok(vec![TAGGED_BLOCK.to_string()])
    }

    fn load_block(&self, block: &str) -> Result<Vec<Document>> {
        if block != TAGGED_BLOCK {
            return Err(Error::format("tagged collection", format!("no block named `{block}`")));
        }
        let bytes = fs::read(&self.path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(parse_tagged(&content)
            .into_iter()
            .map(|(id, text)| Document::new(id, self.tokenizer.tokenize(&text)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::tokenizer::TokenizerConfig;

    fn plain_tokenizer() -> Tokenizer {
        Tokenizer::new(TokenizerConfig { stem: false, remove_stop_words: false })
    }

    #[test]
    fn directories_become_blocks() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1")).unwrap();
        fs::create_dir(dir.path().join("0")).unwrap();
        fs::write(dir.path().join("0").join("a.txt"), "Stanford computing").unwrap();
        fs::write(dir.path().join("0").join(".hidden"), "ignored").unwrap();
        fs::write(dir.path().join("1").join("b"), "network").unwrap();
        fs::write(dir.path().join("loose"), "root file").unwrap();

        let collection = DirectoryCollection::new(dir.path(), plain_tokenizer());
        assert_eq!(collection.blocks().unwrap(), vec!["0", "1", ROOT_BLOCK]);

        let docs = collection.load_block("0").unwrap();
        assert_eq!(docs, vec![Document::new("0_a.txt", vec!["stanford".into(), "computing".into()])]);
        assert_eq!(collection.load_block(ROOT_BLOCK).unwrap()[0].name, ".root_loose");
    }

    #[test]
    fn directory_named_root_is_its_own_block() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("root")).unwrap();
        fs::write(dir.path().join("root").join("inner"), "nested words").unwrap();
        fs::write(dir.path().join("inner"), "loose words").unwrap();

        let collection = DirectoryCollection::new(dir.path(), plain_tokenizer());
        assert_eq!(collection.blocks().unwrap(), vec!["root", ROOT_BLOCK]);
        let nested = collection.load_block("root").unwrap();
        assert_eq!(nested, vec![Document::new("root_inner", vec!["nested".into(), "words".into()])]);
        let loose = collection.load_block(ROOT_BLOCK).unwrap();
        assert_eq!(loose, vec![Document::new(".root_inner", vec!["loose".into(), "words".into()])]);
    }

    #[test]
    fn missing_root_is_unavailable() {
        let collection = DirectoryCollection::new("/definitely/not/here", plain_tokenizer());
        assert!(matches!(collection.blocks(), Err(Error::CollectionUnavailable { .. })));
        let tagged = TaggedCollection::new("/definitely/not/here.all", plain_tokenizer());
        assert!(matches!(tagged.blocks(), Err(Error::CollectionUnavailable { .. })));
    }

    #[test]
    fn tagged_records_keep_title_abstract_and_keywords() {
        let content = ".I 1\n.T\nPreliminary Report\n.B\nCACM December, 1958\n.A\nPerlis, A. J.\n.W\nalgebraic language\n.K\nalgol\n.N\nCA581203 JB\n.X\n100\t5\t1\n.I 2\n.T\nRoots\n";
        let records = parse_tagged(content);
        assert_eq!(
            records,
            vec![
                ("1".to_string(), "Preliminary Report\nalgebraic language\nalgol\n".to_string()),
                ("2".to_string(), "Roots\n".to_string()),
            ]
        );
    }

    #[test]
    fn tagged_collection_loads_one_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cacm.all");
        fs::write(&path, ".I 7\n.T\nLinear Programming\n").unwrap();
        let collection = TaggedCollection::new(&path, plain_tokenizer());
        assert_eq!(collection.blocks().unwrap(), vec![TAGGED_BLOCK]);
        let docs = collection.load_block(TAGGED_BLOCK).unwrap();
        assert_eq!(docs, vec![Document::new("7", vec!["linear".into(), "programming".into()])]);
        assert!(collection.load_block("other").unwrap_err().is_format());
    }
}
