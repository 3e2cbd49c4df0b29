use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::documents::presigning_config;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub file_url: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeKeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewUrlResponse {
    pub url: String,
    pub filename: String,
    pub content_type: &'static str,
}

/// Content type served for a stored resume, by file extension.
pub fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".pdf") {
        "application/pdf"
    } else if key.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if key.ends_with(".doc") {
        "application/msword"
    } else {
        "application/octet-stream"
    }
}

/// Final path component of a client filename, or `None` if nothing usable is left.
pub fn safe_filename(filename: &str) -> Option<&str> {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
        .trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

pub fn resume_key(upload_id: Uuid, filename: &str) -> String {
    format!("resumes/{upload_id}/{filename}")
}

/// Permanent (unsigned) location of an object, for storing on the candidate record.
pub fn object_url(config: &Config, key: &str) -> String {
    match &config.s3_endpoint {
        Some(endpoint) => format!(
            "{}/{}/{key}",
            endpoint.trim_end_matches('/'),
            config.s3_bucket
        ),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            config.s3_bucket, config.aws_region
        ),
    }
}

/// POST /api/candidates/resume
/// Issues a presigned PUT URL the browser uploads the resume to directly.
pub async fn handle_resume_upload_url(
    State(state): State<AppState>,
    Json(req): Json<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, AppError> {
    if req.filename.is_empty() || req.content_type.is_empty() {
        return Err(AppError::Validation(
            "Filename and content type are required".to_string(),
        ));
    }

    let filename = safe_filename(&req.filename)
        .ok_or_else(|| AppError::Validation(format!("Invalid filename '{}'", req.filename)))?;
    let key = resume_key(Uuid::new_v4(), filename);
    let presigned = state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .content_type(&req.content_type)
        .presigned(presigning_config(&state.config)?)
        .await
        .map_err(|e| AppError::S3(format!("Presigning upload failed: {e}")))?;

    info!("Issued resume upload URL for {key}");
    Ok(Json(UploadUrlResponse {
        upload_url: presigned.uri().to_string(),
        file_url: object_url(&state.config, &key),
        key,
    }))
}

/// GET /api/candidates/resume?key=
/// Issues a presigned GET URL that renders the resume inline.
pub async fn handle_resume_view_url(
    State(state): State<AppState>,
    Query(params): Query<ResumeKeyQuery>,
) -> Result<Json<ViewUrlResponse>, AppError> {
    let key = params
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Validation("Resume key is required".to_string()))?;

    let content_type = content_type_for(&key);
    let presigned = state
        .s3
        .get_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .response_content_disposition("inline")
        .response_content_type(content_type)
        .presigned(presigning_config(&state.config)?)
        .await
        .map_err(|e| AppError::S3(format!("Presigning download failed: {e}")))?;

    Ok(Json(ViewUrlResponse {
        url: presigned.uri().to_string(),
        filename: key.rsplit('/').next().unwrap_or(&key).to_string(),
        content_type,
    }))
}
