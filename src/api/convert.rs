use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use palette_remap::{Palette, PaletteError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{AppConfig, Job, JobId};
use crate::services::JobQueue;

/// Response from a successful submission
#[derive(Debug, Serialize, ToSchema)]
pub struct ConvertResponse {
    /// Identifier to poll `/v1/job-status/{job_id}` with
    #[serde(rename = "jobId")]
    pub job_id: String,
}

/// Multipart form accepted by `/v1/convert-async`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertForm {
    /// JPEG or PNG image
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Comma separated `#RRGGBB` colors, e.g. `#ff0000,#00ff00`
    colors: Option<String>,
    /// Name of a preset palette, used when `colors` is absent
    palette: Option<String>,
    /// `"true"` mixes each pixel with its match as `(pixel + match) / 5`, a muted tint
    blend: Option<String>,
}

/// Fields collected from the multipart body before validation
#[derive(Debug, Default)]
struct Submission {
    file: Option<Upload>,
    colors: Option<String>,
    palette: Option<String>,
    blend: bool,
}

#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Submit an image for palette conversion
///
/// The image is queued and converted in the background. Validation happens
/// up front: a rejected submission creates no job and stores no file.
#[utoipa::path(
    post,
    path = "/v1/convert-async",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Job queued", body = ConvertResponse),
        (status = 400, description = "Missing file, unsupported type or invalid palette"),
        (status = 413, description = "Upload too large"),
    ),
    tag = "Conversion"
)]
pub async fn handle_convert(
    State(config): State<Arc<AppConfig>>,
    State(queue): State<Arc<JobQueue>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let max_bytes = config.upload.max_bytes;
    let submission = read_submission(multipart, max_bytes).await?;

    let upload = submission
        .file
        .filter(|upload| !upload.data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("You need to provide a valid image file".to_string()))?;

    let extension = upload_extension(upload.content_type.as_deref(), upload.file_name.as_deref())
        .ok_or_else(|| {
            ApiError::InvalidFileType(
                upload
                    .content_type
                    .clone()
                    .or_else(|| upload.file_name.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
            )
        })?;

    let palette = resolve_palette(
        &config,
        submission.colors.as_deref(),
        submission.palette.as_deref(),
    )?;

    // Everything is valid from here on
    let job_id = JobId::generate();
    let upload_dir = &config.storage.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;
    let source_path = upload_dir.join(format!("{job_id}.{extension}"));
    tokio::fs::write(&source_path, &upload.data).await?;

    let job = Job::new(job_id, source_path, palette, submission.blend);
    let colors = job.palette.len();
    queue
        .push(job)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(
        job_id = %job_id,
        bytes = upload.data.len(),
        colors,
        blend = submission.blend,
        queued = queue.len(),
        "Job submitted"
    );

    Ok((
        StatusCode::OK,
        Json(ConvertResponse {
            job_id: job_id.to_string(),
        }),
    ))
}

async fn read_submission(mut multipart: Multipart, max_bytes: usize) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                if data.len() > max_bytes {
                    return Err(ApiError::PayloadTooLarge { max: max_bytes });
                }
                submission.file = Some(Upload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "colors" | "palette" | "blend" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                match name.as_str() {
                    "colors" => submission.colors = Some(text),
                    "palette" => submission.palette = Some(text),
                    _ => submission.blend = text.trim() == "true",
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(submission)
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { max: max_bytes }
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Map an upload to the extension its source file is stored under.
///
/// The declared content type decides. Without one (or with the generic
/// `application/octet-stream`) the file name's extension is used instead.
pub fn upload_extension(content_type: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match mime.as_deref() {
        Some("image/png") => Some("png"),
        Some("image/jpeg" | "image/jpg" | "image/pjpeg") => Some("jpg"),
        Some(_) => None,
        None => {
            let ext = Path::new(file_name?).extension()?.to_str()?.to_ascii_lowercase();
            match ext.as_str() {
                "png" => Some("png"),
                "jpg" | "jpeg" => Some("jpg"),
                _ => None,
            }
        }
    }
}

/// Build the palette for a submission: explicit colors first, then a preset.
pub fn resolve_palette(
    config: &AppConfig,
    colors: Option<&str>,
    preset: Option<&str>,
) -> Result<Palette, ApiError> {
    let colors = colors.filter(|c| !c.trim().is_empty());
    let preset = preset.map(str::trim).filter(|p| !p.is_empty());

    match (colors, preset) {
        (Some(colors), _) => Ok(Palette::from_hex_list(colors)?),
        (None, Some(name)) => match config.preset(name) {
            Some(palette) => Ok(palette?),
            None => Err(ApiError::UnknownPalette(name.to_string())),
        },
        (None, None) => Err(PaletteError::Empty.into()),
    }
}
