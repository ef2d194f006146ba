use crate::index::IndexKind;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Input that does not follow its declared format: query files, index records, VBE streams.
    #[error("malformed {context}: {detail}")]
    Format { context: String, detail: String },

    /// Dictionaries and postings disagree with each other.
    #[error("index integrity violation: {0}")]
    Integrity(String),

    #[error("{operation} is not available on a {found} index")]
    Unsupported {
        operation: &'static str,
        found: IndexKind,
    },

    #[error("collection unavailable at {path}: {reason}")]
    CollectionUnavailable { path: PathBuf, reason: String },

    #[error("block {block} failed: {source}")]
    Block {
        block: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Meta(#[from] serde_json::Error),
}

impl Error {
    pub fn format(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Format {
            context: context.into(),
            detail: detail.into(),
        }
    }

    pub fn integrity(detail: impl Into<String>) -> Self {
        Error::Integrity(detail.into())
    }

    pub fn in_block(self, block: &str) -> Self {
        Error::Block {
            block: block.to_string(),
            source: Box::new(self),
        }
    }

    /// Malformed user input, as opposed to an I/O or index failure.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }
}
