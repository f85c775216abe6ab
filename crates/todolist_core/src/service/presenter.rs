//! List presenter: decides when to seed from the network and keeps the view
//! in sync with the task store.
//!
//! # Responsibility
//! - Seed an empty store from the remote list once per session.
//! - Route user edits, toggles, deletes and search text through the store.
//! - Notify the view after every change.
//!
//! # Invariants
//! - Store and view are touched only on the presenter's owning thread; the
//!   fetch result is handed back over a channel.
//! - A non-empty store never triggers a fetch.
//! - `NotFound` on edit/toggle is benign: logged, then `Ok`.

use crate::model::task::{now_epoch_ms, Task, TaskDraft, TaskId};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use crate::seed::fetcher::{FetchError, FetchResult, SeedFetcher};
use crate::seed::wire::TodoListResponse;
use crate::service::task_store::TaskStore;
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

const SEED_WORKER_NAME: &str = "todolist-seed";

/// Observer notified by the presenter. Implemented by the UI shell.
pub trait TodoView {
    /// Shows or hides the busy indicator around the seed fetch.
    fn show_progress(&mut self, shown: bool);
    /// Re-reads `count`/`object_at` and redraws the list.
    fn update_table(&mut self);
    /// Non-fatal failure the user may want to see.
    fn show_error(&mut self, _message: &str) {}
}

/// Per-session load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet.
    Idle,
    /// Seed fetch in flight.
    Loading,
    /// Store has content and the view reflects it.
    Populated,
    /// Seed attempt finished without content; no automatic retry.
    Empty,
}

/// Presenter over a task store, a seed fetcher and a view.
pub struct Presenter<R: TaskRepository, V: TodoView> {
    store: TaskStore<R>,
    fetcher: Arc<dyn SeedFetcher>,
    view: V,
    state: LoadState,
    pending_seed: Option<Receiver<FetchResult<TodoListResponse>>>,
}

impl<R: TaskRepository, V: TodoView> Presenter<R, V> {
    pub fn new(store: TaskStore<R>, fetcher: Arc<dyn SeedFetcher>, view: V) -> Self {
        Self {
            store,
            fetcher,
            view,
            state: LoadState::Idle,
            pending_seed: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &TaskStore<R> {
        &self.store
    }

    /// First display of the list.
    ///
    /// Serves stored tasks directly, or starts the seed fetch on a worker
    /// thread when the store is empty. Call `poll_seed`/`wait_for_seed` to
    /// apply the result.
    pub fn load_trackers(&mut self) {
        if self.state == LoadState::Loading {
            debug!("event=load_trackers module=presenter status=skip reason=already_loading");
            return;
        }

        if !self.store.is_empty() {
            info!("event=load_trackers module=presenter status=ok source=store");
            self.store.refresh();
            self.state = LoadState::Populated;
            self.view.update_table();
            return;
        }

        info!("event=load_trackers module=presenter status=start source=network");
        self.state = LoadState::Loading;
        self.view.show_progress(true);

        let (tx, rx) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let spawned = thread::Builder::new()
            .name(SEED_WORKER_NAME.to_string())
            .spawn(move || {
                // A closed receiver means the presenter is gone; drop the result.
                let _ = tx.send(fetcher.fetch_todos());
            });

        match spawned {
            Ok(_) => self.pending_seed = Some(rx),
            Err(err) => self.apply_seed(Err(FetchError::Transport(format!(
                "failed to start seed worker: {err}"
            )))),
        }
    }

    /// Applies the seed result if it has arrived. Never blocks.
    ///
    /// Returns `true` when a result was applied.
    pub fn poll_seed(&mut self) -> bool {
        let Some(rx) = self.pending_seed.as_ref() else {
            return false;
        };

        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(worker_lost()),
        };
        self.pending_seed = None;
        self.apply_seed(result);
        true
    }

    /// Blocks until the in-flight seed result arrives and applies it.
    pub fn wait_for_seed(&mut self) {
        if let Some(rx) = self.pending_seed.take() {
            let result = rx.recv().unwrap_or_else(|_| Err(worker_lost()));
            self.apply_seed(result);
        }
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn object_at(&self, index: usize) -> RepoResult<Task> {
        self.store.object_at(index)
    }

    pub fn list_all(&self) -> Vec<Task> {
        self.store.list_all()
    }

    /// Share-sheet text for the row at `index`.
    pub fn share_text_at(&self, index: usize) -> RepoResult<String> {
        Ok(self.store.object_at(index)?.share_text())
    }

    /// Forwards raw search text to the store and redraws.
    pub fn update_search_text(&mut self, text: &str) {
        self.store.set_search_filter(text);
        self.view.update_table();
    }

    /// Creates a task from the edit form.
    pub fn create_task(&mut self, draft: TaskDraft) -> RepoResult<Task> {
        let result = draft
            .into_new_task(now_epoch_ms())
            .map_err(RepoError::from)
            .and_then(|task| self.store.create(&task));
        if result.is_ok() {
            self.state = LoadState::Populated;
        }
        self.finish_mutation("task_create", result)
    }

    /// Full edit: title and description replaced, timestamp refreshed.
    pub fn edit_task(&mut self, id: TaskId, draft: TaskDraft) -> RepoResult<()> {
        let result = self.store.get(id).and_then(|existing| {
            let existing = existing.ok_or(RepoError::NotFound(id))?;
            let edited = draft.apply_edit(&existing, now_epoch_ms())?;
            self.store.update(&edited)
        });
        self.finish_mutation("task_edit", benign_not_found(result))
    }

    /// Flips `is_completed` through the quick-update path.
    pub fn toggle_completed(&mut self, id: TaskId) -> RepoResult<()> {
        let result = self.store.get(id).and_then(|stored| {
            let mut toggled = stored.ok_or(RepoError::NotFound(id))?;
            toggled.is_completed = !toggled.is_completed;
            self.store.quick_toggle(id, &toggled)
        });
        self.finish_mutation("task_toggle", benign_not_found(result))
    }

    /// Deletes the row at `index` of the current view.
    pub fn delete_at(&mut self, index: usize) -> RepoResult<()> {
        let result = self
            .store
            .object_at(index)
            .and_then(|task| self.store.delete(task.id));
        self.finish_mutation("task_delete", result)
    }

    pub fn delete_task(&mut self, id: TaskId) -> RepoResult<()> {
        let result = self.store.delete(id);
        self.finish_mutation("task_delete", result)
    }

    /// Manual clear-all. The next `load_trackers` seeds again.
    ///
    /// An in-flight seed is abandoned: its result is discarded and the
    /// progress indicator is hidden.
    pub fn reset_all(&mut self) -> RepoResult<()> {
        let result = self.store.delete_all();
        if result.is_ok() {
            if self.pending_seed.take().is_some() {
                info!("event=seed_apply module=presenter status=skip reason=reset");
                self.view.show_progress(false);
            }
            self.state = LoadState::Idle;
        }
        self.finish_mutation("task_delete_all", result)
    }

    fn apply_seed(&mut self, result: FetchResult<TodoListResponse>) {
        self.view.show_progress(false);

        match result {
            Ok(response) => {
                let created_at = now_epoch_ms();
                let tasks: Vec<Task> = response
                    .todos
                    .into_iter()
                    .map(|item| item.into_task(created_at))
                    .collect();
                let total = tasks.len();
                let rejected = self.store.create_batch(&tasks);
                for (id, err) in &rejected {
                    warn!("event=seed_insert module=presenter status=error id={id} error={err}");
                }
                let failed = rejected.len();
                self.state = if self.store.is_empty() {
                    LoadState::Empty
                } else {
                    LoadState::Populated
                };
                info!(
                    "event=seed_apply module=presenter status=ok items={total} failed={failed}"
                );
            }
            Err(err) => {
                error!("event=seed_apply module=presenter status=error error={err}");
                self.state = LoadState::Empty;
                self.view.show_error(&err.to_string());
            }
        }

        self.view.update_table();
    }

    fn finish_mutation<T>(&mut self, event: &'static str, result: RepoResult<T>) -> RepoResult<T> {
        if let Err(err) = &result {
            error!("event={event} module=presenter status=error error={err}");
        }
        self.view.update_table();
        result
    }
}

fn benign_not_found(result: RepoResult<()>) -> RepoResult<()> {
    match result {
        Err(RepoError::NotFound(id)) => {
            info!("event=task_lookup module=presenter status=skip reason=not_found id={id}");
            Ok(())
        }
        other => other,
    }
}

fn worker_lost() -> FetchError {
    FetchError::Transport("seed worker exited without a result".to_string())
}
