use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hiring::catalog::{is_terminal_stage, CULTURE_FIT, INTERVIEW, STAGES};
use crate::hiring::engine::current_stage;
use crate::hiring::models::{Candidate, CandidateStatus};
use crate::positions::models::{Position, PositionState};
use crate::store::parse_timestamp;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Stages counted as "interviewing" on the dashboard.
const INTERVIEW_STAGES: &[&str] = &[CULTURE_FIT, INTERVIEW];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub all_positions_count: usize,
    pub open_positions_count: usize,
    pub onhold_positions_count: usize,
    pub cancelled_positions_count: usize,
    pub filled_positions_count: usize,
    pub all_candidates_count: usize,
    pub active_interviews: usize,
    pub hired: usize,
    pub rejected_candidates_count: usize,
    pub avg_days_to_hire: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionStageCounts {
    pub total: usize,
    pub stages: BTreeMap<String, usize>,
}

pub fn compute_dashboard_stats(positions: &[Position], candidates: &[Candidate]) -> DashboardStats {
    let count_state = |state: PositionState| {
        positions
            .iter()
            .filter(|p| p.state() == Some(state))
            .count()
    };
    let count_status = |status: CandidateStatus| {
        candidates.iter().filter(|c| c.status == status).count()
    };

    DashboardStats {
        all_positions_count: positions.len(),
        open_positions_count: count_state(PositionState::Open),
        onhold_positions_count: count_state(PositionState::Onhold),
        cancelled_positions_count: count_state(PositionState::Cancelled),
        filled_positions_count: count_state(PositionState::Filled),
        all_candidates_count: candidates.len(),
        active_interviews: active_interviews(candidates),
        hired: count_status(CandidateStatus::Hired),
        rejected_candidates_count: count_status(CandidateStatus::Rejected),
        avg_days_to_hire: avg_days_to_hire(candidates),
    }
}

/// Mean whole days from first stage start to last stage end over hired candidates.
///
/// Each candidate's span is rounded up to whole days; a hired candidate with missing
/// or unparseable dates contributes zero but still counts. Zero when nobody is hired.
pub fn avg_days_to_hire(candidates: &[Candidate]) -> i64 {
    let hired: Vec<_> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Hired)
        .collect();
    if hired.is_empty() {
        return 0;
    }

    let total_days: f64 = hired
        .iter()
        .map(|c| {
            let start = c.stages.first().and_then(|s| parse_timestamp(&s.start_date));
            let end = c.stages.last().and_then(|s| s.end_date()).and_then(parse_timestamp);
            match (start, end) {
                (Some(start), Some(end)) => {
                    ((end - start).num_milliseconds() as f64 / MILLIS_PER_DAY).ceil()
                }
                _ => 0.0,
            }
        })
        .sum();

    (total_days / hired.len() as f64).round() as i64
}

/// Number of candidates whose current stage is `stage_id`.
pub fn candidates_in_stage(candidates: &[Candidate], stage_id: &str) -> usize {
    candidates
        .iter()
        .filter(|c| current_stage(c).is_some_and(|s| s.id == stage_id))
        .count()
}

pub fn active_interviews(candidates: &[Candidate]) -> usize {
    INTERVIEW_STAGES
        .iter()
        .map(|stage| candidates_in_stage(candidates, stage))
        .sum()
}

/// Candidate totals for one position, broken down by non-terminal stage.
pub fn position_stage_counts(candidates: &[Candidate], position_id: &str) -> PositionStageCounts {
    let for_position: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.position_id() == Some(position_id))
        .cloned()
        .collect();

    let stages = STAGES
        .iter()
        .filter(|s| !is_terminal_stage(s.id))
        .map(|s| (s.id.to_string(), candidates_in_stage(&for_position, s.id)))
        .collect();

    PositionStageCounts {
        total: for_position.len(),
        stages,
    }
}
