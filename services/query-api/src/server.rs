//! HTTP front-end for question answering and semantic search.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use llm_client::{ChatClient, EmbeddingClient};
use profile_summary::index_path_for;
use vector_index::FlatIndex;

use crate::context::{build_context, fallback_answer, user_message, ANSWER_SYSTEM_PROMPT};
use crate::corpus::ProfileDoc;
use crate::score::top_matches;

/// Default number of records forwarded as context.
pub const DEFAULT_TOP_K: usize = 5;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub file: String,
    pub date: Option<String>,
    pub regions: Vec<&'static str>,
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub context_chars: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub file: String,
    pub variable: String,
    pub summary: String,
    pub distance: f32,
    /// `1 / (1 + distance)`, for display.
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub indices_searched: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub service: String,
    pub records: usize,
    pub records_with_index: usize,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub corpus: Vec<ProfileDoc>,
    pub chat: ChatClient,
    pub embeddings: EmbeddingClient,
    pub json_root: PathBuf,
    pub index_root: PathBuf,
}

// ============================================================================
// Router
// ============================================================================

/// Create the query API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(ask_handler))
        .route("/search", post(search_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /ask - keyword-scored retrieval plus a model answer.
async fn ask_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Json(request): Json<AskRequest>,
) -> Json<AskResponse> {
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, 50);
    let matches = top_matches(&state.corpus, &request.question, top_k);

    if matches.is_empty() {
        return Json(AskResponse {
            answer: "No relevant data found in the summary corpus.".to_string(),
            sources: Vec::new(),
            context_chars: 0,
        });
    }

    let context = build_context(&matches);
    let answer = state
        .chat
        .complete_or_fallback(
            ANSWER_SYSTEM_PROMPT,
            &user_message(&context, &request.question),
            fallback_answer(matches.len()),
        )
        .await;

    let sources = matches
        .iter()
        .map(|(doc, score)| SourceInfo {
            file: doc.record.file.clone(),
            date: doc.date.map(|d| d.format("%Y-%m-%d").to_string()),
            regions: doc.regions.clone(),
            score: *score,
        })
        .collect();

    Json(AskResponse {
        answer,
        sources,
        context_chars: context.len(),
    })
}

/// POST /search - embed the query and search every paired index file.
/// Hit position `i` maps back into `summaries[i]` of the record; files
/// whose index disagrees with their record length are skipped as broken.
async fn search_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<serde_json::Value>)> {
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, 50);

    let query_vectors = state
        .embeddings
        .embed(&[request.query.clone()])
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        })?;
    let query = match query_vectors.into_iter().next() {
        Some(v) => v,
        None => {
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "Embedding API returned no vector" })),
            ))
        }
    };

    let mut hits: Vec<SearchHit> = Vec::new();
    let mut indices_searched = 0usize;

    for doc in &state.corpus {
        let index_path =
            match index_path_for(&state.json_root, &state.index_root, &doc.json_path) {
                Some(path) => path,
                None => continue,
            };
        if !index_path.exists() {
            continue;
        }

        let index = match FlatIndex::read_from(&index_path) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %index_path.display(), error = %e, "Skipping unreadable index");
                continue;
            }
        };

        // The positional coupling is the contract; a count mismatch means
        // one side was rebuilt alone.
        if index.len() != doc.record.summaries.len() {
            warn!(
                path = %index_path.display(),
                vectors = index.len(),
                summaries = doc.record.summaries.len(),
                "Index/record length mismatch, skipping file"
            );
            continue;
        }

        indices_searched += 1;

        let file_hits = match index.search(&query, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(path = %index_path.display(), error = %e, "Index search failed");
                continue;
            }
        };

        for (position, distance) in file_hits {
            let summary = &doc.record.summaries[position];
            hits.push(SearchHit {
                file: doc.record.file.clone(),
                variable: summary.variable.clone(),
                summary: summary.summary.clone(),
                distance,
                score: 1.0 / (1.0 + distance),
            });
        }
    }

    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(top_k);

    info!(
        query_len = request.query.len(),
        indices_searched = indices_searched,
        hits = hits.len(),
        "Semantic search complete"
    );

    Ok(Json(SearchResponse {
        hits,
        indices_searched,
    }))
}

/// GET /stats - corpus size and index coverage.
async fn stats_handler(Extension(state): Extension<Arc<ServerState>>) -> Json<StatsResponse> {
    let records_with_index = state
        .corpus
        .iter()
        .filter(|doc| {
            index_path_for(&state.json_root, &state.index_root, &doc.json_path)
                .map(|p| p.exists())
                .unwrap_or(false)
        })
        .count();

    Json(StatsResponse {
        service: "query-api".to_string(),
        records: state.corpus.len(),
        records_with_index,
    })
}

/// GET /health - health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "query-api"
    }))
}

/// Start the HTTP server.
pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting query API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
