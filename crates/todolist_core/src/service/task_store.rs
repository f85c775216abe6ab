//! Task store: persisted tasks plus the filtered, sorted view the UI reads.
//!
//! # Responsibility
//! - Own every task write through a `TaskRepository`.
//! - Keep one view snapshot that `count`, `object_at` and `list_all` agree on.
//!
//! # Invariants
//! - The view is re-queried after every mutation and filter change.
//! - View order is `created_at DESC`, later inserts first on ties.
//! - Read failures degrade to an empty view with a warning; write failures
//!   are returned to the caller.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskListQuery, TaskRepository};
use log::{debug, warn};

/// Store facade over a task repository.
pub struct TaskStore<R: TaskRepository> {
    repo: R,
    search_text: String,
    view: Vec<Task>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Creates a store with no active filter and loads the initial view.
    pub fn new(repo: R) -> Self {
        let mut store = Self {
            repo,
            search_text: String::new(),
            view: Vec::new(),
        };
        store.refresh();
        store
    }

    /// Inserts a new task and returns the stored record.
    pub fn create(&mut self, task: &Task) -> RepoResult<Task> {
        let id = self.repo.create_task(task)?;
        self.refresh();
        let stored = self.repo.get_task(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created task {id} not found in read-back"))
        })?;
        debug!("event=task_create module=store status=ok");
        Ok(stored)
    }

    /// Inserts every task, skipping failures, and refreshes the view once.
    ///
    /// Returns the rejected tasks' ids with their errors.
    pub fn create_batch(&mut self, tasks: &[Task]) -> Vec<(TaskId, RepoError)> {
        let mut rejected = Vec::new();
        for task in tasks {
            if let Err(err) = self.repo.create_task(task) {
                rejected.push((task.id, err));
            }
        }
        debug!(
            "event=task_create_batch module=store status=ok total={} rejected={}",
            tasks.len(),
            rejected.len()
        );
        self.refresh();
        rejected
    }

    /// Full replace of a stored task's mutable fields.
    ///
    /// Absent id returns `NotFound` and leaves the store untouched.
    pub fn update(&mut self, task: &Task) -> RepoResult<()> {
        self.repo.update_task(task)?;
        debug!("event=task_update module=store status=ok");
        self.refresh();
        Ok(())
    }

    /// Completion-only update.
    ///
    /// Only `is_completed` is taken from `updated`; title, description and
    /// timestamp stay as stored.
    pub fn quick_toggle(&mut self, id: TaskId, updated: &Task) -> RepoResult<()> {
        let mut stored = self.repo.get_task(id)?.ok_or(RepoError::NotFound(id))?;
        stored.is_completed = updated.is_completed;
        self.update(&stored)
    }

    /// Removes one task. Absent id is a silent success.
    pub fn delete(&mut self, id: TaskId) -> RepoResult<()> {
        let removed = self.repo.delete_task(id)?;
        if !removed {
            debug!("event=task_delete module=store status=skip reason=not_found");
        }
        self.refresh();
        Ok(())
    }

    /// Removes every task. Manual reset only.
    pub fn delete_all(&mut self) -> RepoResult<()> {
        let removed = self.repo.delete_all_tasks()?;
        debug!("event=task_delete_all module=store status=ok removed={removed}");
        self.refresh();
        Ok(())
    }

    /// Sets the case-insensitive title filter; empty text clears it.
    pub fn set_search_filter(&mut self, text: &str) {
        text.clone_into(&mut self.search_text);
        self.refresh();
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// True when no task is stored at all, regardless of the filter.
    pub fn is_empty(&self) -> bool {
        match self.repo.count_tasks() {
            Ok(count) => count == 0,
            Err(err) => {
                warn!("event=task_count module=store status=error fallback=empty error={err}");
                true
            }
        }
    }

    /// Number of tasks matching the active filter.
    pub fn count(&self) -> usize {
        self.view.len()
    }

    /// Task at `index` in the filtered, sorted view.
    pub fn object_at(&self, index: usize) -> RepoResult<Task> {
        self.view
            .get(index)
            .cloned()
            .ok_or(RepoError::IndexOutOfRange {
                index,
                count: self.view.len(),
            })
    }

    /// Snapshot of the filtered, sorted view.
    pub fn list_all(&self) -> Vec<Task> {
        self.view.clone()
    }

    /// Direct lookup, ignoring the filter.
    pub fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Re-queries the view for the active filter.
    pub fn refresh(&mut self) {
        let query = TaskListQuery::with_title_filter(self.search_text.as_str());
        self.view = match self.repo.list_tasks(&query) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!("event=task_list module=store status=error fallback=empty error={err}");
                Vec::new()
            }
        };
    }
}
