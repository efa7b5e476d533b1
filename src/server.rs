//! JSON HTTP API.
//!
//! Serves the catalog, the research store, the market overview and the
//! intelligence-backed workflows to browser or script clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version and provider) |
//! | `GET`  | `/segments` | Catalog with `hasResearch` flags |
//! | `GET`  | `/segments/{id}` | One segment and its analysis (or `null`) |
//! | `POST` | `/segments/{id}/analyze` | Extract an analysis from notes and save it |
//! | `POST` | `/segments/{id}/ask` | Web-grounded question; latest answer wins |
//! | `GET`  | `/segments/{id}/ask` | Most recently applied answer |
//! | `POST` | `/segments/{id}/chat` | Question answered from stored research |
//! | `GET`  | `/research` | Every stored analysis |
//! | `GET`  | `/research/{id}` | One stored analysis |
//! | `PUT`  | `/research/{id}` | Replace a stored analysis |
//! | `POST` | `/research/{id}/merge` | Amend a stored analysis |
//! | `DELETE` | `/research/{id}` | Remove a stored analysis |
//! | `POST` | `/research/bulk` | Extract and merge many segments from one narrative |
//! | `GET`  | `/overview` | Category rollups |
//! | `POST` | `/search` | Open market question |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `intelligence_disabled` (400), `upstream` (502), `internal` (500).
//!
//! # Blocking I/O
//!
//! Store mutations write the research file synchronously, so handlers run
//! them through [`run_blocking`] instead of on the async worker.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use landscape_core::catalog;
use landscape_core::intelligence::{Intelligence, IntelligenceError};
use landscape_core::models::{ContextualAnswer, FreeTextAnswer, SavedResearch, SegmentAnalysis};
use landscape_core::research::{DedupPolicy, MergeReport, ResearchStore};
use landscape_core::sequence::LatestResponse;

use crate::analyze::{analyze_notes, bulk_analyze, RequestError, SaveMode};
use crate::ask::{ask_segment_latest, chat, search, SequencedAnswer};
use crate::config::Config;
use crate::gemini::create_intelligence;
use crate::overview::{market_overview, Overview};
use crate::research_cmd::{list_segments, segment_detail, SegmentDetail, SegmentListing};
use crate::storage_fs::{open_store, run_blocking};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<ResearchStore>,
    intelligence: Arc<dyn Intelligence>,
    /// Latest contextual answer per segment.
    asks: Arc<Mutex<HashMap<String, Arc<LatestResponse<ContextualAnswer>>>>>,
}

impl AppState {
    pub fn new(store: Arc<ResearchStore>, intelligence: Arc<dyn Intelligence>) -> Self {
        Self {
            store,
            intelligence,
            asks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn ask_slot(&self, id: &str) -> Arc<LatestResponse<ContextualAnswer>> {
        let mut asks = self.asks.lock().unwrap_or_else(PoisonError::into_inner);
        asks.entry(id.to_string()).or_default().clone()
    }

    fn existing_ask_slot(&self, id: &str) -> Option<Arc<LatestResponse<ContextualAnswer>>> {
        let asks = self.asks.lock().unwrap_or_else(PoisonError::into_inner);
        asks.get(id).cloned()
    }
}

/// Starts the HTTP server with the configured intelligence provider.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let intelligence = create_intelligence(&config.intelligence)?;
    run_server_with_intelligence(config, intelligence).await
}

/// Starts the HTTP server with a caller-supplied [`Intelligence`].
///
/// # Example
///
/// ```rust,no_run
/// use compute_landscape::core::intelligence::DisabledIntelligence;
/// use compute_landscape::server::run_server_with_intelligence;
/// use std::sync::Arc;
///
/// # async fn example(config: &compute_landscape::config::Config) -> anyhow::Result<()> {
/// run_server_with_intelligence(config, Arc::new(DisabledIntelligence)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_intelligence(
    config: &Config,
    intelligence: Arc<dyn Intelligence>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = Arc::new(open_store(config));
    let provider = intelligence.name().to_string();

    let app = router(AppState::new(store, intelligence));

    info!(bind = bind_addr.as_str(), provider = provider.as_str(), "starting server");
    println!("Landscape server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Exposed so tests can serve it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/segments", get(handle_segments))
        .route("/segments/{id}", get(handle_segment))
        .route("/segments/{id}/analyze", post(handle_analyze))
        .route("/segments/{id}/ask", post(handle_ask).get(handle_latest_answer))
        .route("/segments/{id}/chat", post(handle_chat))
        .route("/research", get(handle_research_all))
        .route("/research/bulk", post(handle_bulk))
        .route(
            "/research/{id}",
            get(handle_research_get)
                .put(handle_research_set)
                .delete(handle_research_clear),
        )
        .route("/research/{id}/merge", post(handle_research_merge))
        .route("/overview", get(handle_overview))
        .route("/search", post(handle_search))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::UnknownSegment(_) => not_found(err.to_string()),
            RequestError::EmptyInput(_) => bad_request(err.to_string()),
            RequestError::StoreTask(_) => internal_error(err.to_string()),
            RequestError::Intelligence(IntelligenceError::Disabled) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "intelligence_disabled",
                message: IntelligenceError::Disabled.fallback_message().to_string(),
            },
            RequestError::Intelligence(e) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "upstream",
                message: format!("{} ({})", e.fallback_message(), e),
            },
        }
    }
}

/// Deserialize a JSON body, reporting shape errors in the error envelope.
fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| bad_request(format!("invalid request body: {}", e)))
}

fn known_segment(id: &str) -> Result<(), AppError> {
    if catalog::contains(id) {
        Ok(())
    } else {
        Err(not_found(format!("segment not found: {}", id)))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    intelligence: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        intelligence: state.intelligence.name().to_string(),
    })
}

// ============ Catalog ============

#[derive(Serialize)]
struct SegmentsResponse {
    segments: Vec<SegmentListing>,
}

async fn handle_segments(State(state): State<AppState>) -> Json<SegmentsResponse> {
    Json(SegmentsResponse {
        segments: list_segments(&state.store, None),
    })
}

async fn handle_segment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SegmentDetail>, AppError> {
    segment_detail(&state.store, &id)
        .map(Json)
        .map_err(|e| not_found(e.to_string()))
}

// ============ Research store ============

async fn handle_research_all(State(state): State<AppState>) -> Json<SavedResearch> {
    Json(state.store.get_all())
}

async fn handle_research_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SegmentAnalysis>, AppError> {
    known_segment(&id)?;
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| not_found(format!("no research yet for segment: {}", id)))
}

async fn handle_research_set(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SegmentAnalysis>, AppError> {
    known_segment(&id)?;
    let analysis: SegmentAnalysis = parse_body(body)?;
    let stored = run_blocking(&state.store, move |s| {
        s.set(&id, analysis.clone()).map(|()| analysis)
    })
    .await
    .map_err(|e| internal_error(format!("{:#}", e)))?
    .map_err(|e| not_found(e.to_string()))?;
    Ok(Json(stored))
}

#[derive(Deserialize)]
struct MergeRequest {
    analysis: SegmentAnalysis,
    #[serde(default)]
    dedup: DedupPolicy,
}

async fn handle_research_merge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SegmentAnalysis>, AppError> {
    known_segment(&id)?;
    let req: MergeRequest = parse_body(body)?;
    let merged = run_blocking(&state.store, move |s| s.merge(&id, req.analysis, req.dedup))
        .await
        .map_err(|e| internal_error(format!("{:#}", e)))?
        .map_err(|e| not_found(e.to_string()))?;
    Ok(Json(merged))
}

#[derive(Serialize)]
struct ClearResponse {
    removed: bool,
}

async fn handle_research_clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClearResponse>, AppError> {
    known_segment(&id)?;
    let removed = run_blocking(&state.store, move |s| s.clear(&id))
        .await
        .map_err(|e| internal_error(format!("{:#}", e)))?;
    Ok(Json(ClearResponse { removed }))
}

async fn handle_overview(State(state): State<AppState>) -> Json<Overview> {
    Json(market_overview(&state.store))
}

// ============ Intelligence workflows ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    notes: String,
    #[serde(default)]
    merge: bool,
    #[serde(default)]
    dedup: DedupPolicy,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SegmentAnalysis>, AppError> {
    known_segment(&id)?;
    let req: AnalyzeRequest = parse_body(body)?;
    let mode = if req.merge {
        SaveMode::Merge(req.dedup)
    } else {
        SaveMode::Replace
    };
    let stored = analyze_notes(
        &state.store,
        state.intelligence.as_ref(),
        &id,
        &req.notes,
        mode,
    )
    .await?;
    Ok(Json(stored))
}

#[derive(Deserialize)]
struct BulkRequest {
    narrative: String,
    #[serde(default)]
    segments: Vec<String>,
    #[serde(default)]
    dedup: DedupPolicy,
}

async fn handle_bulk(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<MergeReport>, AppError> {
    let req: BulkRequest = parse_body(body)?;
    let report = bulk_analyze(
        &state.store,
        state.intelligence.as_ref(),
        &req.narrative,
        &req.segments,
        req.dedup,
    )
    .await?;
    Ok(Json(report))
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SequencedAnswer>, AppError> {
    known_segment(&id)?;
    let req: QueryRequest = parse_body(body)?;
    let slot = state.ask_slot(&id);
    let answer = ask_segment_latest(&slot, state.intelligence.as_ref(), &id, &req.query).await?;
    Ok(Json(answer))
}

#[derive(Serialize)]
struct LatestAnswerResponse {
    sequence: u64,
    answer: ContextualAnswer,
}

async fn handle_latest_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LatestAnswerResponse>, AppError> {
    known_segment(&id)?;
    let (sequence, answer) = state
        .existing_ask_slot(&id)
        .and_then(|slot| slot.current())
        .ok_or_else(|| not_found(format!("no answer yet for segment: {}", id)))?;
    Ok(Json(LatestAnswerResponse { sequence, answer }))
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ChatResponse>, AppError> {
    known_segment(&id)?;
    let req: QueryRequest = parse_body(body)?;
    let reply = chat(&state.store, state.intelligence.as_ref(), &id, &req.query).await?;
    Ok(Json(ChatResponse { reply }))
}

async fn handle_search(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<FreeTextAnswer>, AppError> {
    let req: QueryRequest = parse_body(body)?;
    let answer = search(state.intelligence.as_ref(), &req.query).await?;
    Ok(Json(answer))
}
