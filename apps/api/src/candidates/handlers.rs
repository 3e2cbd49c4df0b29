use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::candidates::records::{candidate_from_body, new_candidate};
use crate::errors::AppError;
use crate::hiring::models::Candidate;
use crate::state::AppState;
use crate::store::{next_timestamp, to_item, Table};

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// GET /api/candidates[?id=]
/// One stored candidate when `id` is given, otherwise all of them.
pub async fn handle_get_candidates(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    match params.id {
        Some(id) => {
            let item = state
                .store
                .get(Table::Candidates, &id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
            Ok(Json(item))
        }
        None => Ok(Json(Value::Array(state.store.scan(Table::Candidates).await?))),
    }
}

/// POST /api/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = new_candidate(body, Uuid::new_v4().to_string())?;
    state
        .store
        .put(Table::Candidates, &to_item(&candidate)?)
        .await?;

    info!("Created candidate {} at {}", candidate.id, candidate.status);
    Ok(Json(candidate))
}

/// PUT /api/candidates
/// Whole-record replacement. Last write wins; stage changes should go through
/// /api/candidates/stages instead.
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Candidate>, AppError> {
    if !body.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty()) {
        return Err(AppError::Validation("Candidate ID is required".to_string()));
    }

    let mut candidate = candidate_from_body(body)?;
    candidate.updated_at = Some(Some(next_timestamp(candidate.updated_at(), Utc::now())));
    state
        .store
        .put(Table::Candidates, &to_item(&candidate)?)
        .await?;

    info!("Updated candidate {}", candidate.id);
    Ok(Json(candidate))
}

/// DELETE /api/candidates?id=
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Candidate ID is required".to_string()))?;

    state.store.delete(Table::Candidates, &id).await?;
    info!("Deleted candidate {id}");
    Ok(Json(json!({ "success": true })))
}
