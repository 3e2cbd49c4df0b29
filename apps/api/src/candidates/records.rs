use chrono::Utc;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::hiring::catalog::first_stage;
use crate::hiring::engine::{check_invariants, initial_stage};
use crate::hiring::models::Candidate;
use crate::store::{
    format_timestamp, from_item, from_items, to_item, updated_at_token, ItemStore, Table,
};

/// A candidate together with the `updatedAt` it was read with.
pub struct LoadedCandidate {
    pub candidate: Candidate,
    pub token: Option<String>,
}

pub async fn load_candidate(store: &dyn ItemStore, id: &str) -> Result<LoadedCandidate, AppError> {
    let item = store
        .get(Table::Candidates, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    let token = updated_at_token(&item);
    Ok(LoadedCandidate {
        candidate: from_item(item)?,
        token,
    })
}

pub async fn load_all_candidates(store: &dyn ItemStore) -> Result<Vec<Candidate>, AppError> {
    from_items(store.scan(Table::Candidates).await?)
}

/// Persists a transition result, failing if the record changed since it was loaded.
pub async fn save_transition(
    store: &dyn ItemStore,
    candidate: &Candidate,
    token: Option<&str>,
) -> Result<(), AppError> {
    store
        .replace(Table::Candidates, &to_item(candidate)?, token)
        .await
}

/// Builds a new candidate from a client body. A body without a stage history
/// starts at the first pipeline stage.
pub fn new_candidate(mut body: Map<String, Value>, id: String) -> Result<Candidate, AppError> {
    let has_history = body
        .get("stages")
        .and_then(Value::as_array)
        .is_some_and(|s| !s.is_empty());
    if !has_history {
        body.insert("stages".to_string(), to_item(&[initial_stage()])?);
        body.insert("status".to_string(), Value::from(first_stage().id));
    }
    body.insert("id".to_string(), Value::from(id));

    let now = format_timestamp(Utc::now());
    let mut candidate = candidate_from_body(body)?;
    candidate.created_at = Some(Some(now.clone()));
    candidate.updated_at = Some(Some(now));
    Ok(candidate)
}

/// Parses a client-supplied record and checks its stage history.
pub fn candidate_from_body(body: Map<String, Value>) -> Result<Candidate, AppError> {
    let candidate: Candidate = serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::Validation(format!("Invalid candidate: {e}")))?;
    check_invariants(&candidate)?;
    Ok(candidate)
}
