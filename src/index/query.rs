//! Search query translation.
//!
//! Maps a free-text query plus pagination bounds into the search store's
//! query body. No ordering guarantee beyond the store's relevance ranking;
//! match-all results must not be assumed chronological.

use serde_json::{json, Map, Value};

/// Build the store query for an optional free-text search.
///
/// With `q`: a multi-field relevance match over `title` and `content`.
/// Without: match-all, for full listing through the index. `size`/`from`
/// are forwarded only when supplied so the store's defaults apply.
pub fn build_query(q: Option<&str>, size: Option<u32>, from: Option<u32>) -> Value {
    let query = match q {
        Some(q) => json!({
            "multi_match": {
                "query": q,
                "fields": ["title", "content"]
            }
        }),
        None => json!({"match_all": {}}),
    };

    let mut body = Map::new();
    body.insert("query".to_string(), query);
    if let Some(size) = size {
        body.insert("size".to_string(), json!(size));
    }
    if let Some(from) = from {
        body.insert("from".to_string(), json!(from));
    }
    Value::Object(body)
}
