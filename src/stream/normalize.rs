//! Mutation event normalization.
//!
//! Converts a raw change record into the document operation the index
//! propagator applies. Records that cannot be attributed to a user and item,
//! or that lack the data needed to index them, normalize to `Skip` — never
//! to an error, since a poison record must not stall the stream.

use serde_json::Value;
use tracing::warn;

use super::{attrs_to_json, ChangeRecord};

/// A change record reduced to the operation it implies on the search index.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedOp {
    /// Create or replace the document for `(user_id, todo_id)`.
    Upsert {
        user_id: String,
        todo_id: String,
        document: Value,
    },
    /// Remove the document for `(user_id, todo_id)`.
    Delete { user_id: String, todo_id: String },
    /// Record cannot be indexed; logged and dropped.
    Skip { reason: String },
}

fn skip(record: &ChangeRecord, reason: &str) -> NormalizedOp {
    warn!(event = %record.event_name, reason = %reason, "Skipping change record");
    NormalizedOp::Skip {
        reason: reason.to_string(),
    }
}

/// Normalize one raw change record.
pub fn normalize(record: &ChangeRecord) -> NormalizedOp {
    let user_id = record
        .change
        .keys
        .get("userId")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let todo_id = record
        .change
        .keys
        .get("todoId")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if user_id.is_empty() || todo_id.is_empty() {
        return skip(record, "record has no userId/todoId key attributes");
    }
    let user_id = user_id.to_string();
    let todo_id = todo_id.to_string();

    match record.event_name.as_str() {
        "REMOVE" => NormalizedOp::Delete { user_id, todo_id },
        "INSERT" | "MODIFY" => match &record.change.new_image {
            Some(image) => NormalizedOp::Upsert {
                user_id,
                todo_id,
                document: Value::Object(attrs_to_json(image.clone())),
            },
            None => skip(record, "insert/modify record carries no new image"),
        },
        other => skip(record, &format!("unsupported event type '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ChangeBatch;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ChangeRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_remove_normalizes_to_delete() {
        let rec = record(json!({
            "eventName": "REMOVE",
            "dynamodb": {
                "Keys": {"userId": {"S": "alice"}, "todoId": {"S": "20240101x"}}
            }
        }));
        assert_eq!(
            normalize(&rec),
            NormalizedOp::Delete {
                user_id: "alice".into(),
                todo_id: "20240101x".into()
            }
        );
    }

    #[test]
    fn test_insert_normalizes_to_upsert_with_decoded_document() {
        let rec = record(json!({
            "eventName": "INSERT",
            "dynamodb": {
                "Keys": {"userId": {"S": "alice"}, "todoId": {"S": "20240101x"}},
                "NewImage": {
                    "userId": {"S": "alice"},
                    "todoId": {"S": "20240101x"},
                    "title": {"S": "動物園に行く"},
                    "isImportant": {"BOOL": true}
                }
            }
        }));
        match normalize(&rec) {
            NormalizedOp::Upsert {
                user_id,
                todo_id,
                document,
            } => {
                assert_eq!(user_id, "alice");
                assert_eq!(todo_id, "20240101x");
                assert_eq!(document["title"], "動物園に行く");
                assert_eq!(document["isImportant"], true);
            }
            other => panic!("expected upsert, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_without_new_image_skips() {
        let rec = record(json!({
            "eventName": "INSERT",
            "dynamodb": {
                "Keys": {"userId": {"S": "alice"}, "todoId": {"S": "20240101x"}}
            }
        }));
        assert!(matches!(normalize(&rec), NormalizedOp::Skip { .. }));
    }

    #[test]
    fn test_missing_key_attributes_skip() {
        let no_keys = record(json!({"eventName": "REMOVE", "dynamodb": {}}));
        assert!(matches!(normalize(&no_keys), NormalizedOp::Skip { .. }));

        let empty_user = record(json!({
            "eventName": "REMOVE",
            "dynamodb": {"Keys": {"userId": {"S": ""}, "todoId": {"S": "x"}}}
        }));
        assert!(matches!(normalize(&empty_user), NormalizedOp::Skip { .. }));
    }

    #[test]
    fn test_unknown_event_type_skips() {
        let rec = record(json!({
            "eventName": "TRUNCATE",
            "dynamodb": {
                "Keys": {"userId": {"S": "alice"}, "todoId": {"S": "x"}}
            }
        }));
        assert!(matches!(normalize(&rec), NormalizedOp::Skip { .. }));
    }

    #[test]
    fn test_batch_normalizes_in_delivery_order() {
        let batch: ChangeBatch = serde_json::from_value(json!({
            "Records": [
                {"eventName": "REMOVE", "dynamodb": {"Keys": {"userId": {"S": "u"}, "todoId": {"S": "1"}}}},
                {"eventName": "MODIFY", "dynamodb": {"Keys": {"userId": {"S": "u"}, "todoId": {"S": "2"}}}}
            ]
        }))
        .unwrap();
        let ops: Vec<_> = batch.records.iter().map(normalize).collect();
        assert!(matches!(ops[0], NormalizedOp::Delete { .. }));
        assert!(matches!(ops[1], NormalizedOp::Skip { .. }));
    }
}
