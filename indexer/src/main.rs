mod collection;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use collection::{DirectoryCollection, TaggedCollection};
use sift_core::bsbi::{Bsbi, IndexVariant};
use sift_core::collection::Collection;
use sift_core::frequency::FrequencyIndexer;
use sift_core::presence::PresenceIndexer;
use sift_core::persist;
use sift_core::tokenizer::{Tokenizer, TokenizerConfig};
use sift_core::{Encoding, IndexKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build block-sort-based inverted indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One block per sub-directory, one document per file
    Dir,
    /// A single file of `.I` records
    Tagged,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a collection, replacing the output directory
    Build {
        /// Collection root directory, or the file of a tagged collection
        #[arg(long, env = "DATA_DIR")]
        collection: PathBuf,
        /// Output index directory
        #[arg(long, env = "INDEX_DIR")]
        output: PathBuf,
        /// presence (boolean retrieval) or frequency (vector retrieval)
        #[arg(long, default_value_t = IndexKind::Presence)]
        kind: IndexKind,
        /// plain or vbe
        #[arg(long, default_value_t = Encoding::Plain)]
        encoding: Encoding,
        #[arg(long, value_enum, default_value_t = Format::Dir)]
        format: Format,
        /// Keep words unstemmed
        #[arg(long, default_value_t = false)]
        no_stem: bool,
        /// Index stop words too
        #[arg(long, default_value_t = false)]
        keep_stop_words: bool,
        /// Newline-separated stop-word list replacing the built-in one; saved with the index
        #[arg(long, env = "STOP_WORDS")]
        stop_words: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            collection,
            output,
            kind,
            encoding,
            format,
            no_stem,
            keep_stop_words,
            stop_words,
        } => {
            let mut tokenizer = Tokenizer::new(TokenizerConfig {
                stem: !no_stem,
                remove_stop_words: !keep_stop_words,
            });
            if let Some(path) = stop_words {
                tokenizer = tokenizer.with_stop_words(load_stop_words(&path)?);
            }
            let source: Box<dyn Collection> = match format {
                Format::Dir => Box::new(DirectoryCollection::new(&collection, tokenizer.clone())),
                Format::Tagged => Box::new(TaggedCollection::new(&collection, tokenizer.clone())),
            };
            match kind {
                IndexKind::Presence => build(PresenceIndexer, source.as_ref(), &output, encoding, tokenizer),
                IndexKind::Frequency => build(FrequencyIndexer, source.as_ref(), &output, encoding, tokenizer),
            }
        }
    }
}

fn load_stop_words(path: &Path) -> Result<Vec<String>> {
    let words = persist::load_stop_words(path)
        .with_context(|| format!("reading stop words from {}", path.display()))?;
    tracing::info!(count = words.len(), path = %path.display(), "loaded stop words");
    Ok(words)
}

fn build<V: IndexVariant>(
    variant: V,
    collection: &dyn Collection,
    output: &Path,
    encoding: Encoding,
    tokenizer: Tokenizer,
) -> Result<()> {
    let started = Instant::now();
    let meta = Bsbi::new(variant, output, encoding)
        .with_tokenizer(tokenizer)
        .construct(collection)
        .with_context(|| format!("building index in {}", output.display()))?;
    tracing::info!(
        kind = %meta.kind,
        num_docs = meta.num_docs,
        num_terms = meta.num_terms,
        elapsed_ms = started.elapsed().as_millis() as u64,
        output = %output.display(),
        "index build complete"
    );
    Ok(())
}
