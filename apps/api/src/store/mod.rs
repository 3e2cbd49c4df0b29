//! Key-value item store holding positions and candidates as JSON documents.
//!
//! Handlers talk to `Arc<dyn ItemStore>`; the backend is chosen at startup
//! (`STORE_BACKEND`). Records are opaque JSON here so fields the service does
//! not model survive a load/store cycle.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;

pub use memory::MemoryItemStore;
pub use postgres::PgItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Positions,
    Candidates,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Positions => "positions",
            Table::Candidates => "candidates",
        }
    }
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, table: Table, id: &str) -> Result<Option<Value>, AppError>;

    /// Unconditional upsert keyed by the item's `id`. Last write wins.
    async fn put(&self, table: Table, item: &Value) -> Result<(), AppError>;

    async fn scan(&self, table: Table) -> Result<Vec<Value>, AppError>;

    async fn delete(&self, table: Table, id: &str) -> Result<(), AppError>;

    /// Overwrites an existing item only if its stored `updatedAt` still equals
    /// `expected_updated_at`. Fails with `AppError::Conflict` otherwise.
    async fn replace(
        &self,
        table: Table,
        item: &Value,
        expected_updated_at: Option<&str>,
    ) -> Result<(), AppError>;
}

pub fn item_id(item: &Value) -> Result<&str, AppError> {
    item.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Item id is required".to_string()))
}

/// Raw `updatedAt` of a stored item, used as the optimistic concurrency token.
pub fn updated_at_token(item: &Value) -> Option<String> {
    item.get("updatedAt")
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn to_item<T: Serialize>(record: &T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(record)?)
}

pub fn from_item<T: DeserializeOwned>(item: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(item)?)
}

pub fn from_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, AppError> {
    items.into_iter().map(from_item).collect()
}

/// A record field that may be absent, explicitly `null`, or set.
/// Declare with `#[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]`
/// so all three survive a load/store cycle.
pub type Nullable<T> = Option<Option<T>>;

pub fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Timestamps are stored as text in millisecond ISO-8601 form (`2024-01-02T03:04:05.000Z`).
/// Stored values are never re-formatted; only fields the service writes use this.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// New `updatedAt` for a record last stamped `previous`.
/// Always later than `previous`, so two writes within one millisecond still
/// leave distinct concurrency tokens.
pub fn next_timestamp(previous: Option<&str>, now: DateTime<Utc>) -> String {
    let floor = previous
        .and_then(parse_timestamp)
        .map(|prev| prev + Duration::milliseconds(1));
    format_timestamp(floor.map_or(now, |floor| floor.max(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_use_millisecond_form() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-02T03:04:05.000Z");
        assert_eq!(parse_timestamp("2024-01-02T03:04:05.000Z"), Some(at));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(at));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_next_timestamp_always_moves_forward() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let later = at + Duration::seconds(1);

        assert_eq!(next_timestamp(None, at), "2024-01-02T03:04:05.000Z");
        assert_eq!(
            next_timestamp(Some("2024-01-02T03:04:05.000Z"), at),
            "2024-01-02T03:04:05.001Z"
        );
        assert_eq!(
            next_timestamp(Some("2024-01-02T03:04:05.000Z"), later),
            "2024-01-02T03:04:06.000Z"
        );
        assert_eq!(next_timestamp(Some("garbage"), at), "2024-01-02T03:04:05.000Z");
    }
}
