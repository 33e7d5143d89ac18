//! HTTP Server for the BCA matrix API.
//!
//! Holds the most recent batch in memory. Each upload replaces it as a
//! whole; compare requests only read it.
//!
//! # API Endpoints
//!
//! | Method | Path                          | Description                      |
//! |--------|-------------------------------|----------------------------------|
//! | GET    | `/health`                     | Health check                     |
//! | POST   | `/api/upload`                 | Upload summaries (field `files`) |
//! | GET    | `/api/metrics?mode=`          | Metric choices for a view        |
//! | GET    | `/api/compare?metric=&mode=`  | Comparison grid + discrepancies  |
//! | GET    | `/api/logs`                   | SSE stream for real-time logs    |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{
    error_response, error_response_with_notices, CompareQuery, CompareResponse, MetricsQuery,
    MetricsResponse, UploadResponse,
};
use crate::config::ServerConfig;
use crate::error::{BatchError, ServerResult};
use crate::models::AggregationMode;
use crate::pipeline::{load_batch, Batch, SourceFile};

type ApiError = (StatusCode, Json<Value>);

/// Shared server state: the current batch, if any
#[derive(Clone, Default)]
pub struct AppState {
    batch: Arc<RwLock<Option<Batch>>>,
}

/// Build the router (also used by tests)
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_batch))
        .route("/api/metrics", get(metrics))
        .route("/api/compare", get(compare))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(AppState::default())
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let app = router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 BCA matrix server running on http://localhost:{}", config.port);
    println!("   POST /api/upload  - Upload BCA summaries");
    println!("   GET  /api/metrics - Metric choices");
    println!("   GET  /api/compare - Comparison matrix + discrepancies");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bca-matrix",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: every file field becomes part of the new batch
async fn upload_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
        files.push(SourceFile::new(name, bytes.to_vec()));
    }

    let batch = load_batch(files).map_err(|e| bad_request(&e.to_string()))?;

    if let Err(e) = batch.require_customers() {
        log_error(e.to_string());
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(error_response_with_notices(&e.to_string(), &batch.notices)),
        ));
    }

    let response = UploadResponse::from(&batch);
    *state.batch.write().await = Some(batch);

    Ok(Json(response))
}

/// Metric choices for a view mode
async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let guard = state.batch.read().await;
    let batch = guard.as_ref().ok_or_else(no_batch)?;

    Ok(Json(MetricsResponse {
        mode,
        metrics: batch.metric_options(mode),
        default_metric: batch.default_metric(mode),
    }))
}

/// Comparison grid and discrepancy report
async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ApiError> {
    let mode = parse_mode(query.mode.as_deref())?;
    let guard = state.batch.read().await;
    let batch = guard.as_ref().ok_or_else(no_batch)?;

    let metric = query
        .metric
        .or_else(|| batch.default_metric(mode))
        .ok_or_else(|| bad_request(&format!("No metric available in {} view", mode)))?;

    let analysis = batch.analyze(&metric, mode);
    Ok(Json(CompareResponse::new(&batch.id, analysis)))
}

fn parse_mode(mode: Option<&str>) -> Result<AggregationMode, ApiError> {
    match mode {
        None => Ok(AggregationMode::default()),
        Some(s) => s
            .parse()
            .map_err(|e: BatchError| bad_request(&e.to_string())),
    }
}

fn no_batch() -> ApiError {
    bad_request("No batch uploaded yet")
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}
