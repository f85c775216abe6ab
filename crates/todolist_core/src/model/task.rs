//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record and its form-input counterpart.
//! - Provide the projections rendered by list rows and the share sheet.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is never blank; only the full edit path may change it.
//! - `created_at` is Unix epoch milliseconds and is the only sort key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

const CREATED_DATE_FORMAT: &str = "%d/%m/%Y";

/// Validation errors for task shape invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub is_completed: bool,
}

impl Task {
    /// Creates an open task with a generated ID.
    pub fn new(title: impl Into<String>, description: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, description, created_at)
    }

    /// Creates an open task with a caller-provided ID.
    ///
    /// Used by the seed path where identity is derived from the remote item.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            created_at,
            is_completed: false,
        }
    }

    /// Validates shape invariants before persistence.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Case-insensitive substring match against `title`.
    ///
    /// An empty needle matches every task.
    pub fn title_contains(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Plain-text payload handed to the platform share sheet.
    pub fn share_text(&self) -> String {
        format!("Task: {}\nDescription: {}", self.title, self.description)
    }

    /// `dd/MM/yyyy` label for `created_at` in UTC.
    ///
    /// Falls back to the epoch date when the timestamp is out of range.
    pub fn created_date_label(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.created_at)
            .unwrap_or_default()
            .format(CREATED_DATE_FORMAT)
            .to_string()
    }
}

/// Form input for the create/edit screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Builds a brand-new task from the form.
    ///
    /// # Invariants
    /// - Fresh `id`, `is_completed = false`, `created_at = now_ms`.
    pub fn into_new_task(self, now_ms: i64) -> Result<Task, TaskValidationError> {
        let task = Task::new(self.title.trim(), self.description, now_ms);
        task.validate()?;
        Ok(task)
    }

    /// Applies a full edit on top of an existing task.
    ///
    /// Keeps `id` and `is_completed`. `created_at` is moved to `now_ms`, so
    /// an edited task sorts to the top of the list.
    pub fn apply_edit(self, existing: &Task, now_ms: i64) -> Result<Task, TaskValidationError> {
        let task = Task {
            id: existing.id,
            title: self.title.trim().to_string(),
            description: self.description,
            created_at: now_ms,
            is_completed: existing.is_completed,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
