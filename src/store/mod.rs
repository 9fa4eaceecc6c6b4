//! Primary store access.
//!
//! One partition per user, items sorted by the timestamp-prefixed
//! `todo_id`. Listing is a range query with an exclusive lower bound, so a
//! continuation position stays valid even after its anchor item is deleted.

use async_trait::async_trait;

use crate::cursor::LastKey;
use crate::error::Result;
use crate::model::{TodoItem, TodoPatch};

pub mod dynamo;
pub mod mock;

pub use dynamo::DynamoTodoStore;
pub use mock::MockTodoStore;

/// One page of a partition scan.
#[derive(Debug, Default)]
pub struct TodoPage {
    /// Items in ascending `todo_id` (creation) order.
    pub items: Vec<TodoItem>,
    /// Continuation position when more data may remain; `None` means the
    /// scan is complete.
    pub last_key: Option<LastKey>,
}

/// Interface for todo item persistence.
///
/// Implementations:
/// - `DynamoTodoStore`: DynamoDB storage
/// - `MockTodoStore`: In-memory mock for testing
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Store a new item (or replace an existing one wholesale).
    async fn put(&self, item: &TodoItem) -> Result<()>;

    /// Fetch a single item, `None` when absent for this user.
    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>>;

    /// Apply a partial update and stamp `updated_date`.
    ///
    /// Fails with the not-found kind when the item does not exist.
    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        patch: &TodoPatch,
        updated_date: &str,
    ) -> Result<TodoItem>;

    /// Delete an item. Fails with the not-found kind when absent.
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<()>;

    /// Range-scan the user's partition for items with `todo_id` strictly
    /// greater than `exclusive_start`, in ascending order, at most `limit`
    /// items when supplied.
    async fn list(
        &self,
        user_id: &str,
        exclusive_start: &str,
        limit: Option<i32>,
    ) -> Result<TodoPage>;
}
