//! DynamoDB TodoStore implementation.
//!
//! Table schema:
//! - PK: `userId` (String)
//! - SK: `todoId` (String), timestamp-prefixed for chronological range scans

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use tracing::{debug, error, info};

use super::{TodoPage, TodoStore};
use crate::cursor::LastKey;
use crate::error::{Result, TodoError};
use crate::model::{TodoItem, TodoPatch};

/// DynamoDB implementation of TodoStore.
pub struct DynamoTodoStore {
    client: Client,
    table_name: String,
}

impl DynamoTodoStore {
    /// Create a new DynamoDB todo store.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for todos");

        Ok(Self { client, table_name })
    }

    /// Wrap an existing client, for callers that manage SDK config themselves.
    pub fn with_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(user_id: &str, todo_id: &str) -> HashMap<String, AttributeValue> {
        let mut key = HashMap::new();
        key.insert(
            "userId".to_string(),
            AttributeValue::S(user_id.to_string()),
        );
        key.insert(
            "todoId".to_string(),
            AttributeValue::S(todo_id.to_string()),
        );
        key
    }
}

fn item_to_attrs(item: &TodoItem) -> HashMap<String, AttributeValue> {
    let mut attrs = HashMap::new();
    attrs.insert(
        "userId".to_string(),
        AttributeValue::S(item.user_id.clone()),
    );
    attrs.insert(
        "todoId".to_string(),
        AttributeValue::S(item.todo_id.clone()),
    );
    attrs.insert("title".to_string(), AttributeValue::S(item.title.clone()));
    attrs.insert(
        "content".to_string(),
        AttributeValue::S(item.content.clone()),
    );
    if let Some(due) = &item.due_date {
        attrs.insert("dueDate".to_string(), AttributeValue::S(due.clone()));
    }
    attrs.insert(
        "isImportant".to_string(),
        AttributeValue::Bool(item.is_important),
    );
    attrs.insert(
        "updatedDate".to_string(),
        AttributeValue::S(item.updated_date.clone()),
    );
    attrs
}

fn require_s(attrs: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    match attrs.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        _ => Err(TodoError::Storage(format!(
            "stored item missing string attribute '{}'",
            name
        ))),
    }
}

fn attrs_to_item(attrs: &HashMap<String, AttributeValue>) -> Result<TodoItem> {
    let due_date = match attrs.get("dueDate") {
        Some(AttributeValue::S(s)) => Some(s.clone()),
        _ => None,
    };
    let is_important = matches!(attrs.get("isImportant"), Some(AttributeValue::Bool(true)));
    Ok(TodoItem {
        user_id: require_s(attrs, "userId")?,
        todo_id: require_s(attrs, "todoId")?,
        title: require_s(attrs, "title")?,
        content: require_s(attrs, "content")?,
        due_date,
        is_important,
        updated_date: require_s(attrs, "updatedDate")?,
    })
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn put(&self, item: &TodoItem) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attrs(item)))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, user = %item.user_id, "DynamoDB put_item failed");
                TodoError::Storage("failed to store item".to_string())
            })?;

        debug!(user = %item.user_id, todo = %item.todo_id, "Stored todo item");
        Ok(())
    }

    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, user = %user_id, "DynamoDB get_item failed");
                TodoError::Storage("failed to read item".to_string())
            })?;

        match result.item {
            Some(attrs) => Ok(Some(attrs_to_item(&attrs)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
        updated_date: &str,
    ) -> Result<TodoItem> {
        // "title" and "content" collide with DynamoDB reserved words, so
        // every attribute goes through an expression name alias.
        let mut sets = vec!["#updatedDate = :updatedDate".to_string()];
        let mut req = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .condition_expression("attribute_exists(#todoId)")
            .expression_attribute_names("#todoId", "todoId")
            .expression_attribute_names("#updatedDate", "updatedDate")
            .expression_attribute_values(
                ":updatedDate",
                AttributeValue::S(updated_date.to_string()),
            );

        if let Some(title) = &patch.title {
            sets.push("#title = :title".to_string());
            req = req
                .expression_attribute_names("#title", "title")
                .expression_attribute_values(":title", AttributeValue::S(title.clone()));
        }
        if let Some(content) = &patch.content {
            sets.push("#content = :content".to_string());
            req = req
                .expression_attribute_names("#content", "content")
                .expression_attribute_values(":content", AttributeValue::S(content.clone()));
        }
        if let Some(due) = &patch.due_date {
            sets.push("#dueDate = :dueDate".to_string());
            req = req
                .expression_attribute_names("#dueDate", "dueDate")
                .expression_attribute_values(":dueDate", AttributeValue::S(due.clone()));
        }
        if let Some(important) = patch.is_important {
            sets.push("#isImportant = :isImportant".to_string());
            req = req
                .expression_attribute_names("#isImportant", "isImportant")
                .expression_attribute_values(":isImportant", AttributeValue::Bool(important));
        }

        let result = req
            .update_expression(format!("SET {}", sets.join(", ")))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_conditional_check_failed_exception() => TodoError::NotFound {
                    todo_id: todo_id.to_string(),
                },
                _ => {
                    error!(error = %e, user = %user_id, "DynamoDB update_item failed");
                    TodoError::Storage("failed to update item".to_string())
                }
            })?;

        let attrs = result
            .attributes
            .ok_or_else(|| TodoError::Storage("update returned no item".to_string()))?;
        debug!(user = %user_id, todo = %todo_id, "Updated todo item");
        attrs_to_item(&attrs)
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .condition_expression("attribute_exists(#todoId)")
            .expression_attribute_names("#todoId", "todoId")
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_conditional_check_failed_exception() => TodoError::NotFound {
                    todo_id: todo_id.to_string(),
                },
                _ => {
                    error!(error = %e, user = %user_id, "DynamoDB delete_item failed");
                    TodoError::Storage("failed to delete item".to_string())
                }
            })?;

        debug!(user = %user_id, todo = %todo_id, "Deleted todo item");
        Ok(())
    }

    async fn list(
        &self,
        user_id: &str,
        exclusive_start: &str,
        limit: Option<i32>,
    ) -> Result<TodoPage> {
        let mut query = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#userId = :userId AND #todoId > :start")
            .expression_attribute_names("#userId", "userId")
            .expression_attribute_names("#todoId", "todoId")
            .expression_attribute_values(":userId", AttributeValue::S(user_id.to_string()))
            .expression_attribute_values(":start", AttributeValue::S(exclusive_start.to_string()));
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let result = query.send().await.map_err(|e| {
            error!(error = %e, user = %user_id, "DynamoDB query failed");
            TodoError::Storage("failed to list items".to_string())
        })?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(attrs_to_item)
            .collect::<Result<Vec<_>>>()?;

        let last_key = match result.last_evaluated_key {
            Some(key) => Some(LastKey {
                user_id: require_s(&key, "userId")?,
                todo_id: require_s(&key, "todoId")?,
            }),
            None => None,
        };

        debug!(
            user = %user_id,
            count = items.len(),
            more = last_key.is_some(),
            "Listed todo items"
        );
        Ok(TodoPage { items, last_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TodoItem {
        TodoItem {
            user_id: "alice".into(),
            todo_id: "20240101000000aaaa".into(),
            title: "title".into(),
            content: "content".into(),
            due_date: Some("2024-02-01".into()),
            is_important: true,
            updated_date: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_attr_roundtrip() {
        let item = sample();
        let attrs = item_to_attrs(&item);
        assert_eq!(attrs_to_item(&attrs).unwrap(), item);
    }

    #[test]
    fn test_absent_due_date_is_not_stored() {
        let mut item = sample();
        item.due_date = None;
        let attrs = item_to_attrs(&item);
        assert!(!attrs.contains_key("dueDate"));
        assert_eq!(attrs_to_item(&attrs).unwrap().due_date, None);
    }

    #[test]
    fn test_missing_required_attribute_is_storage_error() {
        let mut attrs = item_to_attrs(&sample());
        attrs.remove("title");
        let err = attrs_to_item(&attrs).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
    }
}
