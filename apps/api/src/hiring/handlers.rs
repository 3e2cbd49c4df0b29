//! Axum route handlers for the hiring pipeline.
//!
//! Each transition loads the candidate, runs the pure engine, and writes back with
//! an `updatedAt` check so two reviewers deciding at once cannot silently overwrite
//! each other.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::records::{load_all_candidates, load_candidate, save_transition};
use crate::errors::AppError;
use crate::hiring::catalog::{stage_by_id, StageDefinition, STAGES};
use crate::hiring::engine::{advance_to_stage, apply_outcome, stage_status, Verdict};
use crate::hiring::metrics::{compute_dashboard_stats, DashboardStats};
use crate::hiring::models::{Candidate, CandidateStatus, Outcome, StageProgress};
use crate::positions::handlers::load_all_positions;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStageRequest {
    pub candidate_id: String,
    pub stage_id: String,
    #[serde(default)]
    pub decision_maker: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcomeRequest {
    pub candidate_id: String,
    pub stage_id: String,
    #[serde(default)]
    pub decision_maker: String,
    #[serde(default)]
    pub notes: String,
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub candidate_id: String,
}

#[derive(Debug, Serialize)]
pub struct StageProgressEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub status: StageProgress,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub status: CandidateStatus,
    pub terminal: bool,
    pub stages: Vec<StageProgressEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/candidates/stages
pub async fn handle_list_stages() -> Json<&'static [StageDefinition]> {
    Json(&STAGES[..])
}

/// POST /api/candidates/stages
/// Passes the current stage and moves the candidate to `stageId`.
pub async fn handle_advance_stage(
    State(state): State<AppState>,
    Json(req): Json<AdvanceStageRequest>,
) -> Result<Json<Candidate>, AppError> {
    if let Err(e) = stage_by_id(&req.stage_id) {
        warn!("Rejected advance for candidate {}: {e}", req.candidate_id);
        return Err(e.into());
    }

    let loaded = load_candidate(state.store.as_ref(), &req.candidate_id).await?;
    let verdict = Verdict {
        decision_maker: &req.decision_maker,
        notes: &req.notes,
    };
    let updated = advance_to_stage(&loaded.candidate, &req.stage_id, verdict).map_err(|e| {
        warn!("Cannot advance candidate {}: {e}", req.candidate_id);
        AppError::from(e)
    })?;

    save_transition(state.store.as_ref(), &updated, loaded.token.as_deref()).await?;
    info!(
        "Candidate {} advanced from {} to {}",
        updated.id, loaded.candidate.status, updated.status
    );
    Ok(Json(updated))
}

/// PUT /api/candidates/stages
/// Records an outcome on a stage and applies the pipeline policy.
pub async fn handle_record_outcome(
    State(state): State<AppState>,
    Json(req): Json<RecordOutcomeRequest>,
) -> Result<Json<Candidate>, AppError> {
    let loaded = load_candidate(state.store.as_ref(), &req.candidate_id).await?;
    let verdict = Verdict {
        decision_maker: &req.decision_maker,
        notes: &req.notes,
    };
    let updated =
        apply_outcome(&loaded.candidate, &req.stage_id, req.outcome, verdict).map_err(|e| {
            warn!("Cannot record outcome for candidate {}: {e}", req.candidate_id);
            AppError::from(e)
        })?;

    save_transition(state.store.as_ref(), &updated, loaded.token.as_deref()).await?;
    info!(
        "Candidate {}: {} at {} → {}",
        updated.id, req.outcome, req.stage_id, updated.status
    );
    Ok(Json(updated))
}

/// GET /api/candidates/progress?candidateId=
/// Per-stage progress for rendering a candidate's pipeline indicator.
pub async fn handle_stage_progress(
    State(state): State<AppState>,
    Query(params): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>, AppError> {
    let candidate = load_candidate(state.store.as_ref(), &params.candidate_id)
        .await?
        .candidate;

    let stages = STAGES
        .iter()
        .map(|def| StageProgressEntry {
            id: def.id,
            name: def.name,
            status: stage_status(&candidate, def.id),
        })
        .collect();

    Ok(Json(ProgressResponse {
        terminal: candidate.is_terminal(),
        status: candidate.status,
        stages,
    }))
}

/// GET /api/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let positions = load_all_positions(state.store.as_ref()).await?;
    let candidates = load_all_candidates(state.store.as_ref()).await?;
    Ok(Json(compute_dashboard_stats(&positions, &candidates)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::routes::test_support::{send, test_app};
    use crate::store::Table;

    async fn create_candidate(app: &axum::Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/candidates",
            Some(json!({"name": "Ada", "positionId": "p-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    fn outcome(id: &str, stage: &str, outcome: &str) -> Value {
        json!({
            "candidateId": id,
            "stageId": stage,
            "decisionMaker": "Michael Chen",
            "notes": "",
            "outcome": outcome
        })
    }

    #[tokio::test]
    async fn test_list_stages() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/api/candidates/stages", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["cv_review", "culture_fit", "interview", "decision"]);
        assert_eq!(body[0]["name"], "CV Review");
    }

    #[tokio::test]
    async fn test_outcome_pass_then_reject() {
        let (app, state) = test_app();
        let id = create_candidate(&app).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "pass")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "culture_fit");
        assert_eq!(body["stages"][0]["outcome"], "pass");
        assert_eq!(body["stages"][0]["decisionMaker"], "Michael Chen");
        assert_eq!(body["stages"][1]["status"], "current");
        assert_eq!(body["name"], "Ada");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "culture_fit", "reject")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["stages"].as_array().unwrap().len(), 2);

        let stored = state.store.get(Table::Candidates, &id).await.unwrap().unwrap();
        assert_eq!(stored["status"], "rejected");
    }

    #[tokio::test]
    async fn test_outcome_unknown_candidate_is_404() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome("missing", "cv_review", "pass")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_outcome_stage_not_in_history_is_404() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "interview", "pass")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "STAGE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_outcome_hire_early_is_400() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "hire")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "OUTCOME_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn test_outcome_unknown_value_is_rejected() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "maybe")),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_advance_skips_to_interview() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/candidates/stages",
            Some(json!({
                "candidateId": id,
                "stageId": "interview",
                "decisionMaker": "Emily Rodriguez",
                "notes": "strong referral"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "interview");
        assert_eq!(body["stages"][0]["outcome"], "pass");
        assert_eq!(body["stages"][0]["notes"], "strong referral");
        assert_eq!(body["stages"][1]["id"], "interview");
    }

    #[tokio::test]
    async fn test_advance_invalid_stage_is_400() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/candidates/stages",
            Some(json!({"candidateId": "whoever", "stageId": "onsite"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_STAGE");
    }

    #[tokio::test]
    async fn test_advance_after_rejection_has_no_current_stage() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "reject")),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/candidates/stages",
            Some(json!({"candidateId": id, "stageId": "culture_fit"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NO_CURRENT_STAGE");
    }

    #[tokio::test]
    async fn test_stage_progress() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "pass")),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/candidates/progress?candidateId={id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "culture_fit");
        assert_eq!(body["terminal"], false);
        let statuses: Vec<_> = body["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["completed", "current", "pending", "pending"]);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let (app, _) = test_app();
        let id = create_candidate(&app).await;
        create_candidate(&app).await;
        send(
            &app,
            Method::POST,
            "/api/positions",
            Some(json!({"title": "SRE", "state": "open"})),
        )
        .await;
        send(
            &app,
            Method::PUT,
            "/api/candidates/stages",
            Some(outcome(&id, "cv_review", "pass")),
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allCandidatesCount"], 2);
        assert_eq!(body["openPositionsCount"], 1);
        assert_eq!(body["activeInterviews"], 1);
        assert_eq!(body["hired"], 0);
        assert_eq!(body["avgDaysToHire"], 0);
    }
}
