mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session::{Engine, Session};
use sift_core::config::DEFAULT_RESULT_LIMIT;
use sift_core::persist;
use sift_core::query_file;
use sift_core::tokenizer;
use sift_core::weighting::{Idf, Similarity, Tf, Weighting};
use sift_core::IndexKind;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sift-query")]
#[command(about = "Query a sift index", long_about = None)]
struct Cli {
    /// Index directory
    #[arg(long, env = "INDEX_DIR", default_value = "./index")]
    index: PathBuf,
    /// Term-frequency weighting (ratio, binary, raw, sqrt, log[:c[:base]], log1p, norm[:k])
    #[arg(long, default_value = "log")]
    tf: Tf,
    /// Inverse-document-frequency weighting (log, unary, log-base[:c[:base]], smooth, proba)
    #[arg(long, default_value = "smooth")]
    idf: Idf,
    /// Similarity measure (cosine, dice, jaccard, overlap)
    #[arg(long, default_value = "cosine")]
    rsv: Similarity,
    /// Maximum number of ranked results
    #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
    limit: usize,
    /// Stop words for indexes that do not carry their own list
    #[arg(long, env = "STOP_WORDS")]
    stop_words: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for queries until the operator stops
    Interactive,
    /// Run every query of a query file
    Batch {
        /// Query file; relative paths are resolved against --queries-dir
        file: PathBuf,
        #[arg(long, env = "QUERIES_DIR")]
        queries_dir: Option<PathBuf>,
    },
    /// Run a single query: `a -b | c` on a presence index, free text otherwise
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    if let Some(path) = &cli.stop_words {
        install_stop_words(path)?;
    }
    let weighting = Weighting { tf: cli.tf, idf: cli.idf, similarity: cli.rsv };
    let engine = Engine::open(&cli.index, weighting, cli.limit)
        .with_context(|| format!("opening index {}", cli.index.display()))?;
    tracing::info!(kind = %engine.kind(), %weighting, "index opened");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), BufWriter::new(stdout.lock()));

    match cli.command {
        Commands::Interactive => session.run(&engine)?,
        Commands::Batch { file, queries_dir } => {
            let path = match queries_dir {
                Some(dir) if file.is_relative() => dir.join(file),
                _ => file,
            };
            let answers = match engine.kind() {
                IndexKind::Presence => query_file::read_boolean_queries(&path)?
                    .iter()
                    .map(|q| engine.run_boolean(q))
                    .collect::<Result<Vec<_>>>()?,
                IndexKind::Frequency => query_file::read_vector_queries(&path)?
                    .iter()
                    .map(|q| engine.run_text(q))
                    .collect::<Result<Vec<_>>>()?,
            };
            tracing::info!(queries = answers.len(), path = %path.display(), "ran query file");
            for answer in &answers {
                session.print_answer(answer)?;
            }
        }
        Commands::Search { query } => {
            let answer = engine.run_text(&query.join(" "))?;
            session.print_answer(&answer)?;
        }
    }
    session.into_output().flush()?;
    Ok(())
}

fn install_stop_words(path: &Path) -> Result<()> {
    let words = persist::load_stop_words(path)
        .with_context(|| format!("reading stop words from {}", path.display()))?;
    tokenizer::install_stop_words(&words);
    tracing::info!(count = words.len(), path = %path.display(), "installed stop words");
    Ok(())
}
