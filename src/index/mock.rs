//! Mock search index for testing.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{IndexError, Result, SearchHits, SearchIndex};

/// In-memory search index with a naive query evaluator.
///
/// `multi_match` is evaluated as substring containment over the requested
/// fields; `match_all` returns every document. Good enough to exercise the
/// propagator and the query translator end to end.
#[derive(Default)]
pub struct MockSearchIndex {
    indices: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    fail_doc_ids: RwLock<HashSet<String>>,
    fail_all: RwLock<bool>,
}

impl MockSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make operations on one document id fail, for isolation tests.
    pub async fn set_fail_for(&self, doc_id: &str) {
        self.fail_doc_ids.write().await.insert(doc_id.to_string());
    }

    pub async fn set_fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Fetch a stored document directly, bypassing search.
    pub async fn document(&self, index: &str, doc_id: &str) -> Option<Value> {
        self.indices
            .read()
            .await
            .get(index)
            .and_then(|docs| docs.get(doc_id))
            .cloned()
    }

    pub async fn doc_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .await
            .get(index)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    async fn check_fail(&self, doc_id: &str) -> Result<()> {
        if *self.fail_all.read().await || self.fail_doc_ids.read().await.contains(doc_id) {
            return Err(IndexError::Status {
                status: 500,
                body: format!("mock failure for {}", doc_id),
            });
        }
        Ok(())
    }
}

fn matches(query: &Value, document: &Value) -> bool {
    if query.get("match_all").is_some() {
        return true;
    }
    let Some(mm) = query.get("multi_match") else {
        return false;
    };
    let needle = mm.get("query").and_then(Value::as_str).unwrap_or_default();
    let fields = mm
        .get("fields")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    fields.iter().any(|field| {
        field
            .as_str()
            .and_then(|name| document.get(name))
            .and_then(Value::as_str)
            .is_some_and(|text| text.contains(needle))
    })
}

#[async_trait]
impl SearchIndex for MockSearchIndex {
    async fn upsert(&self, index: &str, doc_id: &str, document: &Value) -> Result<()> {
        self.check_fail(doc_id).await?;
        self.indices
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(doc_id.to_string(), document.clone());
        Ok(())
    }

    async fn delete(&self, index: &str, doc_id: &str) -> Result<()> {
        self.check_fail(doc_id).await?;
        // Deleting an absent document converges to the same state.
        self.indices
            .write()
            .await
            .get_mut(index)
            .and_then(|docs| docs.remove(doc_id));
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchHits> {
        let indices = self.indices.read().await;
        let Some(docs) = indices.get(index) else {
            return Ok(SearchHits::default());
        };
        let query = body.get("query").cloned().unwrap_or_default();
        let matching: Vec<Value> = docs
            .values()
            .filter(|doc| matches(&query, doc))
            .cloned()
            .collect();
        let total = matching.len() as u64;

        let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
        let size = body
            .get("size")
            .and_then(Value::as_u64)
            .map(|s| s as usize)
            .unwrap_or(usize::MAX);
        let documents = matching.into_iter().skip(from).take(size).collect();

        Ok(SearchHits { documents, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::query::build_query;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_and_search() {
        let index = MockSearchIndex::new();
        index
            .upsert("alice", "a1", &json!({"title": "動物園に行く", "content": "週末"}))
            .await
            .unwrap();
        index
            .upsert("alice", "a2", &json!({"title": "水族館に行く", "content": "来月"}))
            .await
            .unwrap();

        let hits = index
            .search("alice", &build_query(Some("動物園"), None, None))
            .await
            .unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.documents[0]["title"], "動物園に行く");
    }

    #[tokio::test]
    async fn test_size_and_from_paginate_results() {
        let index = MockSearchIndex::new();
        for i in 0..5 {
            index
                .upsert("u", &format!("d{}", i), &json!({"title": format!("t{}", i)}))
                .await
                .unwrap();
        }
        let hits = index
            .search("u", &build_query(None, Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(hits.total, 5);
        assert_eq!(hits.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let index = MockSearchIndex::new();
        index.upsert("u", "d", &json!({"title": "x"})).await.unwrap();
        index.delete("u", "d").await.unwrap();
        index.delete("u", "d").await.unwrap();
        assert_eq!(index.doc_count("u").await, 0);
    }
}
