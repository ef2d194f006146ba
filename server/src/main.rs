use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use server::build_app;
use sift_core::persist;
use sift_core::tokenizer;
use sift_core::weighting::{Idf, Similarity, Tf, Weighting};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, env = "INDEX_DIR", default_value = "./index")]
    index: PathBuf,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    /// Term-frequency weighting of a frequency index
    #[arg(long, default_value = "log")]
    tf: Tf,
    /// Inverse-document-frequency weighting
    #[arg(long, default_value = "smooth")]
    idf: Idf,
    /// Similarity turning dot products into scores
    #[arg(long, default_value = "cosine")]
    rsv: Similarity,
    /// Stop words for indexes that do not carry their own list
    #[arg(long, env = "STOP_WORDS")]
    stop_words: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    if let Some(path) = &args.stop_words {
        install_stop_words(path)?;
    }
    let weighting = Weighting { tf: args.tf, idf: args.idf, similarity: args.rsv };
    let app: Router = build_app(&args.index, weighting)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, %weighting, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn install_stop_words(path: &Path) -> Result<()> {
    let words = persist::load_stop_words(path)
        .with_context(|| format!("reading stop words from {}", path.display()))?;
    tokenizer::install_stop_words(&words);
    tracing::info!(count = words.len(), path = %path.display(), "installed stop words");
    Ok(())
}
