//! HTTP client for an Elasticsearch-compatible search store.
//!
//! Single-attempt calls bounded by the configured request timeout; retry is
//! the stream's job (redelivery), not this client's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{IndexError, Result, SearchHits, SearchIndex};

/// Search store client over its HTTP document API.
///
/// - upsert: `PUT {base}/{index}/_doc/{id}`
/// - delete: `DELETE {base}/{index}/_doc/{id}` (404 treated as success)
/// - search: `POST {base}/{index}/_search`
#[derive(Debug)]
pub struct HttpSearchIndex {
    client: Client,
    base_url: String,
}

impl HttpSearchIndex {
    /// Create a new client for the store at `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = endpoint.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(IndexError::Config(
                "search endpoint not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IndexError::Http)?;

        Ok(Self { client, base_url })
    }

    fn doc_url(&self, index: &str, doc_id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, index, doc_id)
    }

    async fn status_error(response: reqwest::Response) -> IndexError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        IndexError::Status { status, body }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn upsert(&self, index: &str, doc_id: &str, document: &Value) -> Result<()> {
        let response = self
            .client
            .put(self.doc_url(index, doc_id))
            .json(document)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn delete(&self, index: &str, doc_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.doc_url(index, doc_id))
            .send()
            .await?;
        // Absent document: redelivered REMOVE, already converged.
        if response.status() == StatusCode::NOT_FOUND {
            debug!(index = %index, doc = %doc_id, "Delete of absent document");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchHits> {
        let response = self
            .client
            .post(format!("{}/{}/_search", self.base_url, index))
            .json(body)
            .send()
            .await?;
        // An index only exists once the user's first change was propagated.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SearchHits::default());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let payload: Value = response.json().await?;
        let hits = payload
            .get("hits")
            .ok_or_else(|| IndexError::Decode("response has no 'hits'".to_string()))?;

        // "total" is `{value, relation}` on current stores, a bare number
        // on older ones.
        let total = hits
            .get("total")
            .map(|t| t.get("value").unwrap_or(t))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let documents = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("_source").cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchHits { documents, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_normalized() {
        let index =
            HttpSearchIndex::new("http://localhost:9200/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            index.doc_url("alice", "alice2024"),
            "http://localhost:9200/alice/_doc/alice2024"
        );
    }

    #[test]
    fn test_empty_endpoint_is_config_error() {
        let err = HttpSearchIndex::new("", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }
}
