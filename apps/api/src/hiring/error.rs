use thiserror::Error;

use crate::hiring::models::Outcome;

/// Failures raised by the stage engine. Pure values; the engine never logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("Stage '{0}' not found in candidate history")]
    NotFound(String),

    #[error("No current stage found")]
    NoCurrentStage,

    #[error("Invalid stage '{0}'")]
    InvalidStage(String),

    #[error("Outcome '{outcome}' is not allowed at stage '{stage_id}'")]
    OutcomeNotAllowed { stage_id: String, outcome: Outcome },

    #[error("Stage '{stage_id}' is closed while '{current}' is the current stage")]
    StageNotCurrent { stage_id: String, current: String },

    #[error("Inconsistent stage history: {0}")]
    InconsistentHistory(String),
}
