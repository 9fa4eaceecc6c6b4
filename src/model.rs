//! Todo item model and composite sort-key generation.
//!
//! `todo_id` is `<14-digit UTC timestamp><UUIDv4>`. The timestamp prefix
//! makes the sort key monotonically increasing with creation time within a
//! user's partition, so range scans double as chronological listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp prefix format, 14 digits: `YYYYMMDDHHMMSS`.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Earliest possible timestamp prefix, used as the listing sentinel.
pub const MIN_TIMESTAMP_PREFIX: &str = "00000000000000";

/// A single todo item, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    /// Partition identity. Set once at creation from the caller's verified
    /// identity, immutable afterwards.
    pub user_id: String,
    /// Composite sort key: timestamp prefix + UUID suffix.
    pub todo_id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_important: bool,
    /// RFC3339 timestamp, set on every write.
    pub updated_date: String,
}

/// Fields supplied by the caller when creating an item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_important: Option<bool>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_important: Option<bool>,
}

impl TodoPatch {
    /// True when no field is set; such a patch is rejected up front.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.due_date.is_none()
            && self.is_important.is_none()
    }
}

/// Mint a new composite sort key for an item created at `now`.
pub fn new_todo_id(now: DateTime<Utc>) -> String {
    format!("{}{}", now.format(TIMESTAMP_FORMAT), Uuid::new_v4())
}

/// Lower bound for a scan that starts at the beginning of a partition.
///
/// The fresh random suffix keeps the sentinel strictly below every real key
/// without ever colliding with one.
pub fn min_sort_key() -> String {
    format!("{}{}", MIN_TIMESTAMP_PREFIX, Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_todo_id_is_timestamp_prefixed() {
        let t = Utc.with_ymd_and_hms(2024, 3, 7, 9, 30, 5).unwrap();
        let id = new_todo_id(t);
        assert!(id.starts_with("20240307093005"));
        assert_eq!(id.len(), 14 + 36);
    }

    #[test]
    fn test_todo_ids_order_chronologically() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 2).unwrap();
        assert!(new_todo_id(t1) < new_todo_id(t2));
    }

    #[test]
    fn test_min_sort_key_precedes_real_keys() {
        let t = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert!(min_sort_key() < new_todo_id(t));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = TodoItem {
            user_id: "alice".into(),
            todo_id: "20240101000000x".into(),
            title: "t".into(),
            content: "c".into(),
            due_date: None,
            is_important: false,
            updated_date: "2024-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("todoId").is_some());
        assert!(json.get("dueDate").is_none());
    }
}
