pub mod health;

use axum::{
    routing::get,
    Router,
};

use crate::candidates::handlers as candidates;
use crate::documents::{notes, resume};
use crate::hiring::handlers as hiring;
use crate::positions::handlers as positions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Hiring pipeline
        .route(
            "/api/candidates/stages",
            get(hiring::handle_list_stages)
                .post(hiring::handle_advance_stage)
                .put(hiring::handle_record_outcome),
        )
        .route("/api/candidates/progress", get(hiring::handle_stage_progress))
        .route("/api/dashboard", get(hiring::handle_dashboard))
        // Candidates
        .route(
            "/api/candidates",
            get(candidates::handle_get_candidates)
                .post(candidates::handle_create_candidate)
                .put(candidates::handle_update_candidate)
                .delete(candidates::handle_delete_candidate),
        )
        .route(
            "/api/candidates/resume",
            get(resume::handle_resume_view_url).post(resume::handle_resume_upload_url),
        )
        .route(
            "/api/candidates/notes",
            get(notes::handle_get_notes).post(notes::handle_save_notes),
        )
        // Positions
        .route(
            "/api/positions",
            get(positions::handle_get_positions)
                .post(positions::handle_create_position)
                .put(positions::handle_update_position)
                .delete(positions::handle_delete_position),
        )
        .route(
            "/api/positions/candidates",
            get(positions::handle_position_candidate_counts),
        )
        .with_state(state)
}
