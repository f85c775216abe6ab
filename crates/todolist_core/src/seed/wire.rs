//! Wire shapes of the remote todo list endpoint.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One remote todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub todo: String,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// First page of the remote todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub todos: Vec<TodoItem>,
}

impl TodoItem {
    /// Maps the remote item into a local task stamped with `created_at`.
    ///
    /// The remote text becomes both title and description.
    pub fn into_task(self, created_at: i64) -> Task {
        let mut task = Task::with_id(
            remote_task_id(self.id),
            self.todo.clone(),
            self.todo,
            created_at,
        );
        task.is_completed = self.completed;
        task
    }
}

/// Embeds a remote integer id into the low 64 bits of a UUID.
///
/// Deterministic and one-directional; locally generated v4 UUIDs never have
/// an all-zero high half, so the two id spaces cannot collide.
pub fn remote_task_id(remote_id: i64) -> TaskId {
    Uuid::from_u64_pair(0, remote_id as u64)
}
