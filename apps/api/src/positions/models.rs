use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{nullable, Nullable};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Open,
    Onhold,
    Cancelled,
    Filled,
}

/// Position record as persisted in the `positions` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub state: Nullable<PositionState>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub created_at: Nullable<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub updated_at: Nullable<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Position {
    pub fn state(&self) -> Option<PositionState> {
        self.state.flatten()
    }
}
