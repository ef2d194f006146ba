use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type TermId = u32;
pub type DocId = u32;

/// Presence postings: sorted, duplicate-free document ids.
pub type PresenceList = Vec<DocId>;

/// Frequency postings: id -> occurrence count. Keyed by doc id in the term index and
/// by term id in the secondary document index.
pub type FrequencyMap = BTreeMap<u32, u32>;

/// Postings keyed by their leading id, iterated in ascending order.
pub type PartialIndex<P> = BTreeMap<u32, P>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Presence,
    Frequency,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Presence => f.write_str("presence"),
            IndexKind::Frequency => f.write_str("frequency"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "presence" | "bool" | "boolean" => Ok(IndexKind::Presence),
            "frequency" | "freq" | "vector" => Ok(IndexKind::Frequency),
            other => Err(format!("unknown index kind `{other}` (expected presence or frequency)")),
        }
    }
}

/// On-disk representation of postings records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// One whitespace-separated text line per record.
    #[default]
    Plain,
    /// Concatenated variable-byte integers, see [`crate::vbe`].
    Vbe,
}

impl Encoding {
    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Plain => crate::config::PLAIN_EXTENSION,
            Encoding::Vbe => crate::config::VBE_EXTENSION,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Plain => f.write_str("plain"),
            Encoding::Vbe => f.write_str("vbe"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Encoding::Plain),
            "vbe" | "compressed" => Ok(Encoding::Vbe),
            other => Err(format!("unknown encoding `{other}` (expected plain or vbe)")),
        }
    }
}
