use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{nullable, Nullable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Current,
    Completed,
}

/// Verdict recorded when a stage instance is completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Reject,
    Hire,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Reject => "reject",
            Outcome::Hire => "hire",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a catalog stage for one candidate, as shown on progress indicators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageProgress {
    Current,
    Completed,
    Pending,
}

impl From<StageStatus> for StageProgress {
    fn from(status: StageStatus) -> Self {
        match status {
            StageStatus::Current => StageProgress::Current,
            StageStatus::Completed => StageProgress::Completed,
        }
    }
}

/// A candidate's record of having entered (and possibly completed) a stage.
///
/// Optional fields keep the absent/`null`/set distinction and timestamps stay in
/// their stored text form, so instances the engine does not touch round-trip exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageInstance {
    pub id: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub name: Nullable<String>,
    pub status: StageStatus,
    pub start_date: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_date: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub decision_maker: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub notes: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub outcome: Nullable<Outcome>,
    /// Fields this service does not interpret (icons, descriptions, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StageInstance {
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.flatten()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_ref().and_then(Option::as_deref)
    }
}

/// Pipeline position of a candidate: a stage id, or one of the terminal verdicts.
/// Stored as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CandidateStatus {
    Stage(String),
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateStatus::Hired | CandidateStatus::Rejected)
    }

    pub fn as_str(&self) -> &str {
        match self {
            CandidateStatus::Stage(id) => id,
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
        }
    }
}

impl From<String> for CandidateStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "hired" => CandidateStatus::Hired,
            "rejected" => CandidateStatus::Rejected,
            _ => CandidateStatus::Stage(s),
        }
    }
}

impl From<CandidateStatus> for String {
    fn from(status: CandidateStatus) -> Self {
        match status {
            CandidateStatus::Stage(id) => id,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate record as persisted in the `candidates` table.
/// Unknown fields are carried in `extra` so a load/store cycle is lossless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub status: CandidateStatus,
    #[serde(default)]
    pub stages: Vec<StageInstance>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub position_id: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub created_at: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub updated_at: Nullable<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Candidate {
    pub fn position_id(&self) -> Option<&str> {
        self.position_id.as_ref().and_then(Option::as_deref)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_ref().and_then(Option::as_deref)
    }

    /// Index of the most recent instance of `stage_id` in the history.
    pub fn latest_index_of(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().rposition(|s| s.id == stage_id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.stages
            .iter()
            .rposition(|s| s.status == StageStatus::Current)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_status_strings() {
        assert_eq!(CandidateStatus::from("hired".to_string()), CandidateStatus::Hired);
        assert_eq!(
            CandidateStatus::from("rejected".to_string()),
            CandidateStatus::Rejected
        );
        assert_eq!(
            CandidateStatus::from("interview".to_string()),
            CandidateStatus::Stage("interview".to_string())
        );
        assert!(CandidateStatus::Hired.is_terminal());
        assert!(!CandidateStatus::Stage("decision".to_string()).is_terminal());
    }

    #[test]
    fn test_candidate_preserves_unknown_fields() {
        let raw = json!({
            "id": "c-1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "positionId": "p-9",
            "status": "culture_fit",
            "createdAt": "2024-01-02T03:04:05Z",
            "stages": [
                {
                    "id": "cv_review",
                    "name": "CV Review",
                    "icon": "bi-file-text",
                    "status": "completed",
                    "startDate": "2024-01-02T03:04:05Z",
                    "endDate": "2024-01-03T03:04:05Z",
                    "decisionMaker": "Sarah",
                    "notes": "",
                    "outcome": "pass"
                },
                {
                    "id": "culture_fit",
                    "status": "current",
                    "startDate": "2024-01-03T03:04:05Z"
                }
            ]
        });

        let candidate: Candidate = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(candidate.position_id(), Some("p-9"));
        assert_eq!(candidate.extra["email"], "ada@example.com");
        assert_eq!(candidate.stages[0].extra["icon"], "bi-file-text");
        assert_eq!(candidate.stages[0].outcome(), Some(Outcome::Pass));

        let back = serde_json::to_value(&candidate).unwrap();
        assert_eq!(back["name"], "Ada Lovelace");
        assert_eq!(back["status"], "culture_fit");
        assert_eq!(back["stages"][0]["icon"], "bi-file-text");
        assert_eq!(back["stages"][1]["status"], "current");
        assert!(back["stages"][1].get("outcome").is_none());
    }

    #[test]
    fn test_stored_form_survives_round_trip() {
        let raw = json!({
            "id": "c-3",
            "status": "cv_review",
            "positionId": null,
            "createdAt": "2024-01-02T03:04:05.000Z",
            "stages": [{
                "id": "cv_review",
                "name": "",
                "status": "current",
                "startDate": "2024-01-02T03:04:05.000Z",
                "endDate": null,
                "decisionMaker": null,
                "notes": null,
                "outcome": null
            }]
        });
        let candidate: Candidate = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(candidate.position_id(), None);
        assert_eq!(candidate.stages[0].outcome(), None);
        assert_eq!(serde_json::to_value(&candidate).unwrap(), raw);
    }

    #[test]
    fn test_unknown_outcome_is_rejected() {
        let res: Result<Outcome, _> = serde_json::from_value(json!("maybe"));
        assert!(res.is_err());
    }

    #[test]
    fn test_latest_index_prefers_most_recent() {
        let candidate: Candidate = serde_json::from_value(json!({
            "id": "c-2",
            "status": "interview",
            "stages": [
                {"id": "interview", "status": "completed", "startDate": "2024-01-01T00:00:00Z", "outcome": "pass"},
                {"id": "culture_fit", "status": "completed", "startDate": "2024-01-02T00:00:00Z", "outcome": "pass"},
                {"id": "interview", "status": "current", "startDate": "2024-01-03T00:00:00Z"}
            ]
        }))
        .unwrap();
        assert_eq!(candidate.latest_index_of("interview"), Some(2));
        assert_eq!(candidate.current_index(), Some(2));
        assert_eq!(candidate.latest_index_of("decision"), None);
    }
}
