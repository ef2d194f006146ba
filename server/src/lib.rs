use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sift_core::boolean::{self, DnfQuery};
use sift_core::config::DEFAULT_RESULT_LIMIT;
use sift_core::reader::{FrequencyReader, IndexReader, PresenceReader};
use sift_core::vector;
use sift_core::weighting::Weighting;
use sift_core::{DocId, IndexKind};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub engine: IndexKind,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Query engine matching the kind of the served index.
pub enum Searcher {
    Boolean(PresenceReader),
    Vector { reader: FrequencyReader, weighting: Weighting },
}

struct Outcome {
    query: String,
    total_hits: usize,
    results: Vec<SearchHit>,
}

impl Searcher {
    pub fn open(index_dir: &Path, weighting: Weighting) -> sift_core::Result<Self> {
        let index = IndexReader::open(index_dir)?;
        Ok(match index.kind() {
            IndexKind::Presence => Searcher::Boolean(PresenceReader::from_index(index)?),
            IndexKind::Frequency => Searcher::Vector {
                reader: FrequencyReader::from_index(index)?,
                weighting,
            },
        })
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            Searcher::Boolean(_) => IndexKind::Presence,
            Searcher::Vector { .. } => IndexKind::Frequency,
        }
    }

    fn search(&self, q: &str, k: usize) -> sift_core::Result<Outcome> {
        match self {
            Searcher::Boolean(reader) => {
                let query: DnfQuery = q.parse()?;
                let normalized = query.normalized(reader.index().tokenizer());
                let ids: Vec<DocId> = boolean::evaluate(&normalized, reader)?.into_iter().collect();
                let shown = &ids[..ids.len().min(k)];
                let names = reader.index().document_names(shown)?;
                Ok(Outcome {
                    query: query.to_string(),
                    total_hits: ids.len(),
                    results: shown
                        .iter()
                        .zip(names)
                        .map(|(&doc_id, name)| SearchHit { doc_id, name, score: None })
                        .collect(),
                })
            }
            Searcher::Vector { reader, weighting } => {
                let tokens = reader.index().tokenizer().tokenize(q);
                let mut ranked = vector::score_all(&tokens, reader, weighting)?;
                let total_hits = ranked.len();
                ranked.truncate(k);
                let hits = vector::attach_names(ranked, reader)?;
                Ok(Outcome {
                    query: tokens.join(" "),
                    total_hits,
                    results: hits
                        .into_iter()
                        .map(|h| SearchHit { doc_id: h.doc_id, name: h.name, score: Some(h.score) })
                        .collect(),
                })
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher>,
}

pub enum ApiError {
    Index(sift_core::Error),
    Internal(String),
}

impl From<sift_core::Error> for ApiError {
    fn from(err: sift_core::Error) -> Self {
        ApiError::Index(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Index(err) if err.is_format() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Index(err) => {
                tracing::error!(error = %err, "search failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn build_app<P: AsRef<Path>>(index_dir: P, weighting: Weighting) -> Result<Router> {
    let searcher = Searcher::open(index_dir.as_ref(), weighting)?;
    tracing::info!(kind = %searcher.kind(), index = %index_dir.as_ref().display(), "serving index");
    let app_state = AppState { searcher: Arc::new(searcher) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let k = params.k.clamp(1, DEFAULT_RESULT_LIMIT);
    let searcher = state.searcher.clone();
    let engine = searcher.kind();
    // Index files are read synchronously.
    let outcome = tokio::task::spawn_blocking(move || searcher.search(&params.q, k))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: outcome.query,
        engine,
        took_s: elapsed.as_secs_f64(),
        total_hits: outcome.total_hits,
        results: outcome.results,
    }))
}
