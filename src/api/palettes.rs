use axum::{extract::State, response::Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::AppConfig;
use crate::services::{JobQueue, JobStore};

/// A named preset palette
#[derive(Debug, Serialize, ToSchema)]
pub struct PresetPalette {
    pub name: String,
    /// Colors as `#RRGGBB`
    pub colors: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PalettesResponse {
    pub palettes: Vec<PresetPalette>,
}

/// Queue depth and finished job totals
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct QueueStats {
    /// Jobs waiting for the worker
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

/// List preset palettes
///
/// Any of these names can be sent as the `palette` field of a submission.
#[utoipa::path(
    get,
    path = "/v1/palettes",
    responses(
        (status = 200, description = "Configured presets", body = PalettesResponse),
    ),
    tag = "Palettes"
)]
pub async fn handle_palettes(State(config): State<Arc<AppConfig>>) -> Json<PalettesResponse> {
    let palettes = config
        .palettes
        .iter()
        .map(|(name, colors)| PresetPalette {
            name: name.clone(),
            colors: colors.clone(),
        })
        .collect();

    Json(PalettesResponse { palettes })
}

/// Queue statistics
#[utoipa::path(
    get,
    path = "/v1/queue",
    responses(
        (status = 200, description = "Current queue depth and outcome totals", body = QueueStats),
    ),
    tag = "Jobs"
)]
pub async fn handle_queue_stats(
    State(queue): State<Arc<JobQueue>>,
    State(store): State<Arc<dyn JobStore>>,
) -> Json<QueueStats> {
    let counts = store.counts().await;
    Json(QueueStats {
        pending: queue.len(),
        completed: counts.completed,
        failed: counts.failed,
    })
}
