//! Operation layer: listing, search, and item CRUD.
//!
//! `TodoService` is constructed with its collaborators injected; process
//! entry points own client lifecycles, components never reach for globals.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

use crate::cursor::CursorCodec;
use crate::error::{Result, TodoError};
use crate::index::{index_name, query::build_query, SearchIndex};
use crate::model::{min_sort_key, new_todo_id, NewTodo, TodoItem, TodoPatch};
use crate::store::TodoStore;

/// One page of a user's items plus the continuation token, when more remain.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub todos: Vec<TodoItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Search hits decoded back into items, with the store's total match count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub todos: Vec<TodoItem>,
    pub total_count: u64,
}

/// The todo backend's request-facing operations.
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    index: Arc<dyn SearchIndex>,
    cursor: CursorCodec,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, index: Arc<dyn SearchIndex>, cursor: CursorCodec) -> Self {
        Self {
            store,
            index,
            cursor,
        }
    }

    /// Create an item owned by the verified caller.
    pub async fn create(&self, user_id: &str, new: NewTodo) -> Result<TodoItem> {
        if new.title.is_empty() {
            return Err(TodoError::Validation("title must not be empty".to_string()));
        }
        if new.content.is_empty() {
            return Err(TodoError::Validation(
                "content must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let item = TodoItem {
            user_id: user_id.to_string(),
            todo_id: new_todo_id(now),
            title: new.title,
            content: new.content,
            due_date: new.due_date,
            is_important: new.is_important.unwrap_or(false),
            updated_date: now.to_rfc3339(),
        };
        self.store.put(&item).await?;
        Ok(item)
    }

    pub async fn get(&self, user_id: &str, todo_id: &str) -> Result<TodoItem> {
        self.store
            .get(user_id, todo_id)
            .await?
            .ok_or_else(|| TodoError::NotFound {
                todo_id: todo_id.to_string(),
            })
    }

    pub async fn update(&self, user_id: &str, todo_id: &str, patch: TodoPatch) -> Result<TodoItem> {
        if patch.is_empty() {
            return Err(TodoError::Validation(
                "update carries no fields".to_string(),
            ));
        }
        if patch.title.as_deref() == Some("") {
            return Err(TodoError::Validation("title must not be empty".to_string()));
        }
        if patch.content.as_deref() == Some("") {
            return Err(TodoError::Validation(
                "content must not be empty".to_string(),
            ));
        }
        self.store
            .update(user_id, todo_id, &patch, &Utc::now().to_rfc3339())
            .await
    }

    pub async fn delete(&self, user_id: &str, todo_id: &str) -> Result<()> {
        self.store.delete(user_id, todo_id).await
    }

    /// List the caller's items in creation order, resuming from `next_token`
    /// when supplied.
    ///
    /// Cursor problems surface as validation errors, store problems as
    /// storage errors; the handler layer maps them to different statuses.
    pub async fn list(
        &self,
        user_id: &str,
        limit: Option<i32>,
        next_token: Option<&str>,
    ) -> Result<TodoList> {
        if matches!(limit, Some(l) if l <= 0) {
            return Err(TodoError::Validation("limit must be positive".to_string()));
        }

        let start = match next_token {
            Some(token) => self.cursor.decode(token, user_id)?.todo_id,
            None => min_sort_key(),
        };

        let page = self.store.list(user_id, &start, limit).await?;
        let next_token = page
            .last_key
            .as_ref()
            .map(|key| self.cursor.encode(key))
            .transpose()?;

        Ok(TodoList {
            todos: page.items,
            next_token,
        })
    }

    /// Free-text search over the caller's index; `q` absent means match-all.
    ///
    /// Reads the eventually-consistent secondary store, so a just-written
    /// item may not appear yet. Result order is store relevance, not
    /// chronological.
    pub async fn search(
        &self,
        user_id: &str,
        q: Option<&str>,
        size: Option<u32>,
        from: Option<u32>,
    ) -> Result<SearchResult> {
        let body = build_query(q, size, from);
        let hits = self
            .index
            .search(&index_name(user_id), &body)
            .await
            .map_err(|e| {
                error!(error = %e, user = %user_id, "Search store query failed");
                TodoError::Storage("search failed".to_string())
            })?;

        let todos = hits
            .documents
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<TodoItem>(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, user = %user_id, "Dropping malformed index document");
                    None
                }
            })
            .collect();

        Ok(SearchResult {
            todos,
            total_count: hits.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MockSearchIndex;
    use crate::store::MockTodoStore;

    fn service() -> TodoService {
        TodoService::new(
            Arc::new(MockTodoStore::new()),
            Arc::new(MockSearchIndex::new()),
            CursorCodec::new(b"unit-test-secret-32-bytes-long!!".to_vec()),
        )
    }

    fn new_todo(title: &str, content: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            content: content.to_string(),
            due_date: None,
            is_important: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_required_fields() {
        let svc = service();
        for (title, content) in [("", "c"), ("t", "")] {
            let err = svc.create("u", new_todo(title, content)).await.unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_create_stamps_id_and_updated_date() {
        let svc = service();
        let item = svc.create("u", new_todo("t", "c")).await.unwrap();
        assert_eq!(item.user_id, "u");
        assert_eq!(item.todo_id.len(), 50);
        assert!(!item.is_important);
        assert!(!item.updated_date.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let err = service().get("u", "absent").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let err = service()
            .update("u", "t", TodoPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_rejects_non_positive_limit() {
        let err = service().list("u", Some(0), None).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_storage_failure_is_storage_kind() {
        let store = Arc::new(MockTodoStore::new());
        store.set_fail_on_list(true).await;
        let svc = TodoService::new(
            store,
            Arc::new(MockSearchIndex::new()),
            CursorCodec::new(b"unit-test-secret-32-bytes-long!!".to_vec()),
        );
        let err = svc.list("u", None, None).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
    }
}
