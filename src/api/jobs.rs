use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{JobId, JobOutcome};
use crate::services::JobStore;

/// Location of a converted image
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Absolute path of the PNG on the server
    pub output_path: String,
    /// Relative URL the PNG can be downloaded from
    pub download_url: String,
}

/// Status of a finished job
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatusResponse {
    Completed { result: JobResult },
    Failed { error: String },
}

impl JobStatusResponse {
    fn from_outcome(job_id: &JobId, outcome: JobOutcome) -> Self {
        match outcome {
            JobOutcome::Completed { output_path } => JobStatusResponse::Completed {
                result: JobResult {
                    output_path: output_path.display().to_string(),
                    download_url: format!("/v1/output/{job_id}"),
                },
            },
            JobOutcome::Failed { error } => JobStatusResponse::Failed { error },
        }
    }
}

/// Unknown ids, malformed ids and unfinished jobs all look the same
async fn find_outcome(store: &dyn JobStore, raw_id: &str) -> Result<(JobId, JobOutcome), ApiError> {
    let job_id: JobId = raw_id.parse().map_err(|_| ApiError::JobNotFound)?;
    let outcome = store.lookup(&job_id).await.ok_or(ApiError::JobNotFound)?;
    Ok((job_id, outcome))
}

/// Get the result of a conversion job
///
/// Jobs that are still queued or running are reported exactly like unknown
/// ids. Use `/v1/queue` to see how much work is pending.
#[utoipa::path(
    get,
    path = "/v1/job-status/{job_id}",
    params(
        ("job_id" = String, Path, description = "Identifier returned by /v1/convert-async"),
    ),
    responses(
        (status = 200, description = "Job finished (completed or failed)", body = JobStatusResponse),
        (status = 404, description = "Job not found or still processing"),
    ),
    tag = "Jobs"
)]
pub async fn handle_job_status(
    State(store): State<Arc<dyn JobStore>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let (job_id, outcome) = find_outcome(store.as_ref(), &job_id).await?;
    tracing::debug!(job_id = %job_id, status = ?outcome.status(), "Job status requested");
    Ok(Json(JobStatusResponse::from_outcome(&job_id, outcome)))
}

/// Download the PNG produced by a completed job
#[utoipa::path(
    get,
    path = "/v1/output/{job_id}",
    params(
        ("job_id" = String, Path, description = "Identifier returned by /v1/convert-async"),
    ),
    responses(
        (status = 200, description = "Converted image as image/png"),
        (status = 404, description = "Job not found, not finished, failed or output removed"),
    ),
    tag = "Jobs"
)]
pub async fn handle_output(
    State(store): State<Arc<dyn JobStore>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let (job_id, outcome) = find_outcome(store.as_ref(), &job_id).await?;
    let output_path = outcome.output_path().ok_or(ApiError::JobNotFound)?;

    let bytes = match tokio::fs::read(output_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(job_id = %job_id, path = %output_path.display(), "Output file missing");
            return Err(ApiError::JobNotFound);
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", job_id.output_file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}
