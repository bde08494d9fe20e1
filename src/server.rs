//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::fs;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{ImageTransformer, InMemoryJobStore, JobQueue, JobStore, Worker};

/// Room for multipart boundaries and the text fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub queue: Arc<JobQueue>,
    pub store: Arc<dyn JobStore>,
    pub worker: Arc<Worker>,
}

impl AppState {
    /// Start the background worker. It stops once `shutdown` is set to `true`.
    pub fn spawn_worker(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        self.worker.clone().spawn(shutdown)
    }
}

/// Create application state from a loaded configuration.
///
/// Creates the upload and output directories and stores their absolute
/// paths in the returned config.
pub fn create_app_state(mut config: AppConfig) -> anyhow::Result<AppState> {
    for dir in [&mut config.storage.upload_dir, &mut config.storage.output_dir] {
        fs::create_dir_all(&*dir)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", dir.display()))?;
        *dir = fs::canonicalize(&*dir)?;
    }

    for name in config.palettes.keys() {
        if let Some(Err(e)) = config.preset(name) {
            tracing::warn!(palette = %name, error = %e, "Preset palette is invalid and cannot be used");
        }
    }

    let config = Arc::new(config);
    let queue = Arc::new(JobQueue::new());
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let transformer = Arc::new(ImageTransformer::new(
        &config.storage.output_dir,
        config.output.optimize,
    ));
    let worker = Arc::new(
        Worker::new(queue.clone(), store.clone(), transformer)
            .with_poll_interval(config.queue.poll_interval())
            .with_job_timeout(config.queue.job_timeout()),
    );

    tracing::info!(
        upload_dir = %config.storage.upload_dir.display(),
        output_dir = %config.storage.output_dir.display(),
        "Storage ready"
    );

    Ok(AppState {
        config,
        queue,
        store,
        worker,
    })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD);
    let cors_enabled = state.config.cors.enabled;

    let router = Router::new()
        // Conversion API
        .route("/v1/convert-async", post(handle_convert))
        .route("/v1/job-status/:job_id", get(handle_job_status))
        .route("/v1/output/:job_id", get(handle_output))
        .route("/v1/palettes", get(handle_palettes))
        .route("/v1/queue", get(handle_queue_stats))
        // Web frontend
        .route("/", get(api::handle_index))
        .route("/static/*path", get(api::handle_static))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // Job status changes over time; clients must poll, not cache
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_convert(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_convert(State(state.config), State(state.queue), multipart).await
}

async fn handle_job_status(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Json<api::JobStatusResponse>, ApiError> {
    api::handle_job_status(State(state.store), path).await
}

async fn handle_output(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Response, ApiError> {
    api::handle_output(State(state.store), path).await
}

async fn handle_palettes(State(state): State<AppState>) -> Json<api::PalettesResponse> {
    api::handle_palettes(State(state.config)).await
}

async fn handle_queue_stats(State(state): State<AppState>) -> Json<api::QueueStats> {
    api::handle_queue_stats(State(state.queue), State(state.store)).await
}
