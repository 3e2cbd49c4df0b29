use serde::Serialize;

use crate::hiring::StageError;

/// One step of the hiring pipeline. Order is the position in [`STAGES`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StageDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const CV_REVIEW: &str = "cv_review";
pub const CULTURE_FIT: &str = "culture_fit";
pub const INTERVIEW: &str = "interview";
pub const DECISION: &str = "decision";

/// Canonical pipeline, first to last.
pub static STAGES: [StageDefinition; 4] = [
    StageDefinition {
        id: CV_REVIEW,
        name: "CV Review",
        description: "Initial review of candidate's CV and qualifications",
    },
    StageDefinition {
        id: CULTURE_FIT,
        name: "Culture Fit",
        description: "Assessment of cultural alignment and soft skills",
    },
    StageDefinition {
        id: INTERVIEW,
        name: "Interview",
        description: "Technical and behavioral interview process",
    },
    StageDefinition {
        id: DECISION,
        name: "Decision",
        description: "Final hiring decision",
    },
];

pub fn first_stage() -> &'static StageDefinition {
    &STAGES[0]
}

/// Looks up a stage in the catalog.
pub fn stage_by_id(stage_id: &str) -> Result<&'static StageDefinition, StageError> {
    STAGES
        .iter()
        .find(|s| s.id == stage_id)
        .ok_or_else(|| StageError::InvalidStage(stage_id.to_string()))
}

/// Returns the stage after `current_stage_id`.
///
/// An unrecognized id behaves like the last stage: `None`.
pub fn next_stage(current_stage_id: &str) -> Option<&'static StageDefinition> {
    let idx = STAGES.iter().position(|s| s.id == current_stage_id)?;
    STAGES.get(idx + 1)
}

/// True only for the last stage of the pipeline.
pub fn is_terminal_stage(stage_id: &str) -> bool {
    STAGES.last().is_some_and(|s| s.id == stage_id)
}
