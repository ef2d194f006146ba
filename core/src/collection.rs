use crate::error::Result;

/// A document as handed over by the loading and tokenization collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tokens,
        }
    }
}

/// Source of documents partitioned into disjoint, named blocks.
pub trait Collection: Sync {
    /// Block names in processing order. Failing here aborts construction before the
    /// output directory is touched.
    fn blocks(&self) -> Result<Vec<String>>;

    fn load_block(&self, block: &str) -> Result<Vec<Document>>;
}

/// A collection held in memory, tokenized by whitespace and lowercased.
#[derive(Debug, Default, Clone)]
pub struct MemoryCollection {
    blocks: Vec<(String, Vec<Document>)>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block<'a>(mut self, name: &str, docs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let docs = docs
            .into_iter()
            .map(|(doc, text)| {
                Document::new(doc, text.split_whitespace().map(str::to_lowercase).collect())
            })
            .collect();
        self.blocks.push((name.to_string(), docs));
        self
    }
}

impl Collection for MemoryCollection {
    fn blocks(&self) -> Result<Vec<String>> {
        Ok(self.blocks.iter().map(|(name, _)| name.clone()).collect())
    }

    fn load_block(&self, block: &str) -> Result<Vec<Document>> {
        Ok(self
            .blocks
            .iter()
            .find(|(name, _)| name == block)
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default())
    }
}
