//! Stage engine: pure transition logic for a candidate's journey through the pipeline.
//!
//! Every function takes a consistent snapshot of a candidate and returns a new one.
//! Callers own persistence and must serialize writes per candidate id.
//!
//! Transition policy for [`apply_outcome`], evaluated in order:
//! 1. terminal stage → `hired` on `hire`, otherwise `rejected`; nothing appended
//! 2. `reject` anywhere else → `rejected`; nothing appended
//! 3. `pass` → append the next catalog stage as current
//!
//! `hire` before the terminal stage is refused up front.

use chrono::{DateTime, Utc};
use serde_json::Map;

use crate::hiring::catalog::{
    first_stage, is_terminal_stage, next_stage, stage_by_id, StageDefinition,
};
use crate::hiring::models::{
    Candidate, CandidateStatus, Outcome, StageInstance, StageProgress, StageStatus,
};
use crate::hiring::StageError;
use crate::store::{format_timestamp, next_timestamp};

/// Reviewer-supplied fields recorded on the instance being completed.
#[derive(Debug, Clone, Copy)]
pub struct Verdict<'a> {
    pub decision_maker: &'a str,
    pub notes: &'a str,
}

/// Opening instance for a new candidate.
pub fn initial_stage() -> StageInstance {
    initial_stage_at(Utc::now())
}

pub fn initial_stage_at(now: DateTime<Utc>) -> StageInstance {
    open_instance(first_stage(), now)
}

/// Records `outcome` on the most recent instance of `stage_id` and moves the candidate on.
pub fn apply_outcome(
    candidate: &Candidate,
    stage_id: &str,
    outcome: Outcome,
    verdict: Verdict<'_>,
) -> Result<Candidate, StageError> {
    apply_outcome_at(candidate, stage_id, outcome, verdict, Utc::now())
}

pub fn apply_outcome_at(
    candidate: &Candidate,
    stage_id: &str,
    outcome: Outcome,
    verdict: Verdict<'_>,
    now: DateTime<Utc>,
) -> Result<Candidate, StageError> {
    let idx = candidate
        .latest_index_of(stage_id)
        .ok_or_else(|| StageError::NotFound(stage_id.to_string()))?;
    stage_by_id(stage_id)?;

    if let Some(ci) = candidate.current_index() {
        if ci != idx {
            return Err(StageError::StageNotCurrent {
                stage_id: stage_id.to_string(),
                current: candidate.stages[ci].id.clone(),
            });
        }
    }

    let terminal = is_terminal_stage(stage_id);
    if outcome == Outcome::Hire && !terminal {
        return Err(StageError::OutcomeNotAllowed {
            stage_id: stage_id.to_string(),
            outcome,
        });
    }

    let mut next = candidate.clone();
    complete_instance(&mut next.stages[idx], outcome, verdict, now);

    next.status = if terminal {
        match outcome {
            Outcome::Hire => CandidateStatus::Hired,
            _ => CandidateStatus::Rejected,
        }
    } else {
        match outcome {
            Outcome::Reject => CandidateStatus::Rejected,
            Outcome::Pass => match next_stage(stage_id) {
                Some(def) => {
                    next.stages.push(open_instance(def, now));
                    CandidateStatus::Stage(def.id.to_string())
                }
                None => CandidateStatus::Stage(stage_id.to_string()),
            },
            Outcome::Hire => CandidateStatus::Stage(stage_id.to_string()),
        }
    };
    next.updated_at = Some(Some(next_timestamp(candidate.updated_at(), now)));

    Ok(next)
}

/// Operator override: passes the current stage and jumps to `stage_id`,
/// which need not be the structurally next stage.
pub fn advance_to_stage(
    candidate: &Candidate,
    stage_id: &str,
    verdict: Verdict<'_>,
) -> Result<Candidate, StageError> {
    advance_to_stage_at(candidate, stage_id, verdict, Utc::now())
}

pub fn advance_to_stage_at(
    candidate: &Candidate,
    stage_id: &str,
    verdict: Verdict<'_>,
    now: DateTime<Utc>,
) -> Result<Candidate, StageError> {
    let target = stage_by_id(stage_id)?;
    let ci = candidate
        .current_index()
        .ok_or(StageError::NoCurrentStage)?;

    let mut next = candidate.clone();
    complete_instance(&mut next.stages[ci], Outcome::Pass, verdict, now);
    next.stages.push(open_instance(target, now));
    next.status = CandidateStatus::Stage(target.id.to_string());
    next.updated_at = Some(Some(next_timestamp(candidate.updated_at(), now)));

    Ok(next)
}

/// Status of the named stage for this candidate; `Pending` if never reached.
pub fn stage_status(candidate: &Candidate, stage_id: &str) -> StageProgress {
    candidate
        .latest_index_of(stage_id)
        .map(|i| candidate.stages[i].status.into())
        .unwrap_or(StageProgress::Pending)
}

pub fn current_stage(candidate: &Candidate) -> Option<&StageInstance> {
    candidate.current_index().map(|i| &candidate.stages[i])
}

/// Verifies a whole candidate record against the history invariants.
/// Used when a record arrives from outside the engine.
pub fn check_invariants(candidate: &Candidate) -> Result<(), StageError> {
    let inconsistent = |msg: String| Err(StageError::InconsistentHistory(msg));

    let Some(last) = candidate.stages.last() else {
        return inconsistent("stage history is empty".to_string());
    };

    let current: Vec<usize> = candidate
        .stages
        .iter()
        .enumerate()
        .filter(|(_, s)| s.status == StageStatus::Current)
        .map(|(i, _)| i)
        .collect();

    if current.len() > 1 {
        return inconsistent(format!("{} stages are current", current.len()));
    }

    if let Some(s) = candidate
        .stages
        .iter()
        .find(|s| s.status == StageStatus::Current && s.outcome().is_some())
    {
        return inconsistent(format!("current stage '{}' already has an outcome", s.id));
    }

    match (&candidate.status, current.first()) {
        (status, Some(_)) if status.is_terminal() => {
            inconsistent(format!("candidate is {status} but stage '{}' is current", last.id))
        }
        (CandidateStatus::Stage(id), Some(&ci)) => {
            if ci != candidate.stages.len() - 1 {
                inconsistent(format!("current stage '{}' is not the latest", candidate.stages[ci].id))
            } else if last.id != *id {
                inconsistent(format!("status '{id}' does not match current stage '{}'", last.id))
            } else {
                Ok(())
            }
        }
        (CandidateStatus::Stage(id), None) => {
            inconsistent(format!("status '{id}' has no current stage"))
        }
        _ => Ok(()),
    }
}

fn open_instance(def: &StageDefinition, now: DateTime<Utc>) -> StageInstance {
    StageInstance {
        id: def.id.to_string(),
        name: Some(Some(def.name.to_string())),
        status: StageStatus::Current,
        start_date: format_timestamp(now),
        end_date: None,
        decision_maker: Some(Some(String::new())),
        notes: Some(Some(String::new())),
        outcome: None,
        extra: Map::new(),
    }
}

fn complete_instance(
    instance: &mut StageInstance,
    outcome: Outcome,
    verdict: Verdict<'_>,
    now: DateTime<Utc>,
) {
    instance.status = StageStatus::Completed;
    instance.end_date = Some(Some(format_timestamp(now)));
    instance.decision_maker = Some(Some(verdict.decision_maker.to_string()));
    instance.notes = Some(Some(verdict.notes.to_string()));
    instance.outcome = Some(Some(outcome));
}
