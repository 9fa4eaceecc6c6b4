//! Secondary search index: client interface and change propagation.
//!
//! Each user gets one index (lower-cased user id; the search store requires
//! case-insensitive names). Document ids concatenate `user_id` and
//! `todo_id`, which is collision-free because `todo_id` is globally unique.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::stream::{normalize, ChangeBatch, NormalizedOp};

pub mod http;
pub mod mock;
pub mod query;

pub use http::HttpSearchIndex;
pub use mock::MockSearchIndex;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors from the search store.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("search store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search store response not understood: {0}")]
    Decode(String),

    #[error("search index misconfigured: {0}")]
    Config(String),
}

/// Hits returned by a search query, passed through to the caller.
#[derive(Debug, Default)]
pub struct SearchHits {
    /// Document bodies (`_source` fields) in store ranking order.
    pub documents: Vec<Value>,
    /// Total matching documents, which may exceed the page returned.
    pub total: u64,
}

/// Interface for the secondary search store.
///
/// Implementations:
/// - `HttpSearchIndex`: Elasticsearch-compatible HTTP API
/// - `MockSearchIndex`: In-memory mock for testing
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create or replace a document. Re-applying the same call is safe.
    async fn upsert(&self, index: &str, doc_id: &str, document: &Value) -> Result<()>;

    /// Remove a document. Deleting an absent document is not an error.
    async fn delete(&self, index: &str, doc_id: &str) -> Result<()>;

    /// Run a query against one index.
    async fn search(&self, index: &str, body: &Value) -> Result<SearchHits>;
}

/// Index name for a user. The store requires lower-case names.
pub fn index_name(user_id: &str) -> String {
    user_id.to_lowercase()
}

/// Stable document id for an item.
pub fn doc_id(user_id: &str, todo_id: &str) -> String {
    format!("{}{}", user_id, todo_id)
}

/// Outcome of one record within a propagated batch.
#[derive(Debug)]
pub enum RecordOutcome {
    Applied,
    Skipped { reason: String },
    Failed { reason: String },
}

/// Result of propagating one change-stream batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One outcome per record, in delivery order.
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Applied))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Failed { .. }))
            .count()
    }
}

/// Applies normalized change operations to the search store.
///
/// Propagation is at-least-once from the stream's perspective: records may
/// be redelivered, so every operation must be idempotent. A failure on one
/// record never aborts the batch, and the entry point never surfaces an
/// error to the stream trigger; the batch report is for logging and tests.
pub struct IndexPropagator {
    index: Arc<dyn SearchIndex>,
}

impl IndexPropagator {
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Apply one raw change-stream batch.
    ///
    /// Records are processed in delivery order. Failures are collected per
    /// record and logged once the whole batch has been attempted.
    pub async fn apply_batch(&self, batch: &ChangeBatch) -> BatchReport {
        let mut report = BatchReport::default();

        for record in &batch.records {
            let outcome = match normalize(record) {
                NormalizedOp::Upsert {
                    user_id,
                    todo_id,
                    document,
                } => {
                    let index = index_name(&user_id);
                    let id = doc_id(&user_id, &todo_id);
                    match self.index.upsert(&index, &id, &document).await {
                        Ok(()) => {
                            debug!(index = %index, doc = %id, "Indexed document");
                            RecordOutcome::Applied
                        }
                        Err(e) => RecordOutcome::Failed {
                            reason: e.to_string(),
                        },
                    }
                }
                NormalizedOp::Delete { user_id, todo_id } => {
                    let index = index_name(&user_id);
                    let id = doc_id(&user_id, &todo_id);
                    match self.index.delete(&index, &id).await {
                        Ok(()) => {
                            debug!(index = %index, doc = %id, "Removed document from index");
                            RecordOutcome::Applied
                        }
                        Err(e) => RecordOutcome::Failed {
                            reason: e.to_string(),
                        },
                    }
                }
                NormalizedOp::Skip { reason } => RecordOutcome::Skipped { reason },
            };
            report.outcomes.push(outcome);
        }

        for (position, outcome) in report.outcomes.iter().enumerate() {
            if let RecordOutcome::Failed { reason } = outcome {
                error!(
                    record = position,
                    reason = %reason,
                    "Index propagation failed for record"
                );
            }
        }
        debug!(
            records = batch.records.len(),
            applied = report.applied(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Propagated change batch"
        );

        report
    }
}
