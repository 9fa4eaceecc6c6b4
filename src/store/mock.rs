//! Mock todo store for testing.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TodoPage, TodoStore};
use crate::cursor::LastKey;
use crate::error::{Result, TodoError};
use crate::model::{TodoItem, TodoPatch};

/// In-memory todo store keeping one sorted partition per user.
#[derive(Default)]
pub struct MockTodoStore {
    partitions: RwLock<HashMap<String, BTreeMap<String, TodoItem>>>,
    fail_on_list: RwLock<bool>,
    fail_on_write: RwLock<bool>,
}

impl MockTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// Number of items stored for a user.
    pub async fn count(&self, user_id: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(user_id)
            .map(|p| p.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TodoStore for MockTodoStore {
    async fn put(&self, item: &TodoItem) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(TodoError::Storage("mock write failure".to_string()));
        }
        self.partitions
            .write()
            .await
            .entry(item.user_id.clone())
            .or_default()
            .insert(item.todo_id.clone(), item.clone());
        Ok(())
    }

    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(user_id)
            .and_then(|p| p.get(todo_id))
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
        updated_date: &str,
    ) -> Result<TodoItem> {
        if *self.fail_on_write.read().await {
            return Err(TodoError::Storage("mock write failure".to_string()));
        }
        let mut partitions = self.partitions.write().await;
        let item = partitions
            .get_mut(user_id)
            .and_then(|p| p.get_mut(todo_id))
            .ok_or_else(|| TodoError::NotFound {
                todo_id: todo_id.to_string(),
            })?;
        if let Some(title) = &patch.title {
            item.title = title.clone();
        }
        if let Some(content) = &patch.content {
            item.content = content.clone();
        }
        if let Some(due) = &patch.due_date {
            item.due_date = Some(due.clone());
        }
        if let Some(important) = patch.is_important {
            item.is_important = important;
        }
        item.updated_date = updated_date.to_string();
        Ok(item.clone())
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(TodoError::Storage("mock write failure".to_string()));
        }
        let removed = self
            .partitions
            .write()
            .await
            .get_mut(user_id)
            .and_then(|p| p.remove(todo_id));
        match removed {
            Some(_) => Ok(()),
            None => Err(TodoError::NotFound {
                todo_id: todo_id.to_string(),
            }),
        }
    }

    async fn list(
        &self,
        user_id: &str,
        exclusive_start: &str,
        limit: Option<i32>,
    ) -> Result<TodoPage> {
        if *self.fail_on_list.read().await {
            return Err(TodoError::Storage("mock list failure".to_string()));
        }
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(user_id) else {
            return Ok(TodoPage::default());
        };

        let mut range = partition.range((
            Bound::Excluded(exclusive_start.to_string()),
            Bound::Unbounded,
        ));
        let mut items = Vec::new();
        match limit {
            Some(limit) => {
                for item in range.by_ref().map(|(_, v)| v.clone()) {
                    if items.len() as i32 >= limit {
                        break;
                    }
                    items.push(item);
                }
            }
            None => items.extend(range.by_ref().map(|(_, v)| v.clone())),
        }

        // Mirror the real store: a continuation key is present only when
        // the page was cut short by the limit.
        let last_key = match (limit, items.last()) {
            (Some(limit), Some(last)) if items.len() as i32 == limit => {
                let more = partition
                    .range((Bound::Excluded(last.todo_id.clone()), Bound::Unbounded))
                    .next()
                    .is_some();
                more.then(|| LastKey {
                    user_id: user_id.to_string(),
                    todo_id: last.todo_id.clone(),
                })
            }
            _ => None,
        };

        Ok(TodoPage { items, last_key })
    }
}
