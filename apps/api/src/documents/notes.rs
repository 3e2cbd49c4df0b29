use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Query, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

/// Body of a stored notes object. Only `notes` is needed when reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredNotes {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesQuery {
    pub candidate_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveNotesRequest {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct SaveNotesResponse {
    pub key: String,
    pub message: &'static str,
}

pub fn notes_key(candidate_id: &str) -> String {
    format!("notes/{candidate_id}/notes.json")
}

/// Key a save writes to. A client-chosen key must stay under the candidate's own
/// `notes/<candidateId>/` prefix.
pub fn save_key(candidate_id: &str, requested: Option<&str>) -> Result<String, AppError> {
    if candidate_id.contains('/') {
        return Err(AppError::Validation(format!(
            "Invalid candidate ID '{candidate_id}'"
        )));
    }
    match requested.filter(|k| !k.is_empty()) {
        None => Ok(notes_key(candidate_id)),
        Some(key) => {
            let prefix = format!("notes/{candidate_id}/");
            let rest = key.strip_prefix(&prefix).unwrap_or_default();
            if rest.is_empty() || rest.split('/').any(|seg| seg.is_empty() || seg == "..") {
                return Err(AppError::Validation(format!(
                    "Notes key must be under {prefix}"
                )));
            }
            Ok(key.to_string())
        }
    }
}

/// GET /api/candidates/notes?candidateId=
/// A candidate with no notes object yet gets empty notes.
pub async fn handle_get_notes(
    State(state): State<AppState>,
    Query(params): Query<NotesQuery>,
) -> Result<Json<NotesResponse>, AppError> {
    let candidate_id = params
        .candidate_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Candidate ID is required".to_string()))?;
    let key = notes_key(&candidate_id);

    let result = state
        .s3
        .get_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .send()
        .await;

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            let err = err.into_service_error();
            if err.is_no_such_key() {
                return Ok(Json(NotesResponse {
                    notes: String::new(),
                    key,
                }));
            }
            return Err(AppError::S3(format!("Reading {key} failed: {err}")));
        }
    };

    let data = output
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("Reading {key} failed: {e}")))?
        .into_bytes();
    let stored: StoredNotes = serde_json::from_slice(&data)?;

    Ok(Json(NotesResponse {
        notes: stored.notes.unwrap_or_default(),
        key,
    }))
}

/// POST /api/candidates/notes
pub async fn handle_save_notes(
    State(state): State<AppState>,
    Json(req): Json<SaveNotesRequest>,
) -> Result<Json<SaveNotesResponse>, AppError> {
    if req.candidate_id.is_empty() {
        return Err(AppError::Validation("Candidate ID is required".to_string()));
    }

    let key = save_key(&req.candidate_id, req.key.as_deref())?;
    let stored = StoredNotes {
        candidate_id: req.candidate_id,
        notes: Some(req.notes.unwrap_or_default()),
        updated_at: Some(Utc::now()),
    };
    let body = Bytes::from(serde_json::to_vec(&stored)?);

    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Writing {key} failed: {e}")))?;

    info!("Saved notes for candidate {} to {key}", stored.candidate_id);
    Ok(Json(SaveNotesResponse {
        key,
        message: "Notes saved successfully",
    }))
}
