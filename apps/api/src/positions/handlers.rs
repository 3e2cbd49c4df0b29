use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::candidates::handlers::IdQuery;
use crate::candidates::records::load_all_candidates;
use crate::errors::AppError;
use crate::hiring::metrics::{position_stage_counts, PositionStageCounts};
use crate::positions::models::Position;
use crate::state::AppState;
use crate::store::{format_timestamp, from_items, to_item, ItemStore, Table};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionIdQuery {
    pub position_id: Option<String>,
}

pub async fn load_all_positions(store: &dyn ItemStore) -> Result<Vec<Position>, AppError> {
    from_items(store.scan(Table::Positions).await?)
}

fn position_from_body(body: Map<String, Value>) -> Result<Position, AppError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::Validation(format!("Invalid position: {e}")))
}

/// GET /api/positions[?id=]
pub async fn handle_get_positions(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    match params.id {
        Some(id) => {
            let item = state
                .store
                .get(Table::Positions, &id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Position {id} not found")))?;
            Ok(Json(item))
        }
        None => Ok(Json(Value::Array(state.store.scan(Table::Positions).await?))),
    }
}

/// POST /api/positions
pub async fn handle_create_position(
    State(state): State<AppState>,
    Json(mut body): Json<Map<String, Value>>,
) -> Result<Json<Position>, AppError> {
    body.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
    let mut position = position_from_body(body)?;
    let now = format_timestamp(Utc::now());
    position.created_at = Some(Some(now.clone()));
    position.updated_at = Some(Some(now));

    state
        .store
        .put(Table::Positions, &to_item(&position)?)
        .await?;
    info!("Created position {}", position.id);
    Ok(Json(position))
}

/// PUT /api/positions
pub async fn handle_update_position(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Position>, AppError> {
    if !body.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty()) {
        return Err(AppError::Validation("Position ID is required".to_string()));
    }

    let mut position = position_from_body(body)?;
    position.updated_at = Some(Some(format_timestamp(Utc::now())));
    state
        .store
        .put(Table::Positions, &to_item(&position)?)
        .await?;
    info!("Updated position {}", position.id);
    Ok(Json(position))
}

/// DELETE /api/positions?id=
pub async fn handle_delete_position(
    State(state): State<AppState>,
    Query(params): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Position ID is required".to_string()))?;

    state.store.delete(Table::Positions, &id).await?;
    info!("Deleted position {id}");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/positions/candidates?positionId=
pub async fn handle_position_candidate_counts(
    State(state): State<AppState>,
    Query(params): Query<PositionIdQuery>,
) -> Result<Json<PositionStageCounts>, AppError> {
    let position_id = params
        .position_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Position ID is required".to_string()))?;

    let candidates = load_all_candidates(state.store.as_ref()).await?;
    Ok(Json(position_stage_counts(&candidates, &position_id)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn test_position_crud() {
        let (app, _) = test_app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/positions",
            Some(json!({"title": "Backend Developer", "state": "open"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_string();

        let mut edited = created.clone();
        edited["state"] = json!("filled");
        let (status, updated) = send(&app, Method::PUT, "/api/positions", Some(edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["state"], "filled");
        assert_eq!(updated["title"], "Backend Developer");

        let (_, fetched) = send(&app, Method::GET, &format!("/api/positions?id={id}"), None).await;
        assert_eq!(fetched["state"], "filled");

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/positions?id={id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, all) = send(&app, Method::GET, "/api/positions", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_position_unknown_state_is_400() {
        let (app, _) = test_app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/positions",
            Some(json!({"title": "PM", "state": "archived"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_position_candidate_counts() {
        let (app, _) = test_app();
        for _ in 0..2 {
            send(
                &app,
                Method::POST,
                "/api/candidates",
                Some(json!({"positionId": "p-7"})),
            )
            .await;
        }
        send(
            &app,
            Method::POST,
            "/api/candidates",
            Some(json!({"positionId": "p-8"})),
        )
        .await;

        let (status, counts) = send(
            &app,
            Method::GET,
            "/api/positions/candidates?positionId=p-7",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts["total"], 2);
        assert_eq!(counts["stages"]["cv_review"], 2);
        assert_eq!(counts["stages"]["interview"], 0);

        let (status, _) = send(&app, Method::GET, "/api/positions/candidates", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
