//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose list, edit, toggle, delete, seed and share flows to Dart via FRB.
//! - Map core errors to flat envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection; no state survives between calls
//!   except the resolved config and the shared HTTP client.

use log::warn;
use std::sync::{Arc, OnceLock};
use todolist_core::db::open_db;
use todolist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, HttpSeedFetcher, LoadState, Presenter, RepoResult, SeedFetcher,
    SqliteTaskRepository, Task, TaskDraft, TaskId, TaskStore, TodoView,
};
use uuid::Uuid;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
static SEED_FETCHER: OnceLock<Arc<HttpSeedFetcher>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the task list as rendered by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemView {
    /// Stable task ID in string form.
    pub id: String,
    pub title: String,
    pub description: String,
    /// `dd/MM/yyyy` creation date.
    pub created_date: String,
    pub is_completed: bool,
}

/// Filtered list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListEnvelope {
    /// Rows newest first; empty on failure.
    pub items: Vec<TodoItemView>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected task ID, when the action targets one task.
    pub task_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Lists tasks whose title contains `search_text` (case-insensitive).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank search text lists everything.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list(search_text: String) -> TodoListEnvelope {
    let listed = with_presenter(|presenter| {
        presenter.update_search_text(search_text.as_str());
        Ok(presenter.list_all())
    });

    match listed {
        Ok(tasks) => {
            let message = if tasks.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("Found {} task(s).", tasks.len())
            };
            TodoListEnvelope {
                items: tasks.iter().map(to_item_view).collect(),
                message,
            }
        }
        Err(err) => TodoListEnvelope {
            items: Vec::new(),
            message: format!("todo_list failed: {err}"),
        },
    }
}

/// Creates an incomplete task stamped with the current time.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank titles are rejected with `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_create(title: String, description: String) -> TodoActionResponse {
    match with_presenter(|presenter| presenter.create_task(TaskDraft::new(title, description))) {
        Ok(task) => TodoActionResponse::success("Task created.", Some(task.id.to_string())),
        Err(err) => TodoActionResponse::failure(format!("todo_create failed: {err}")),
    }
}

/// Replaces title and description and refreshes the creation timestamp.
///
/// An unknown `id` is not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_edit(id: String, title: String, description: String) -> TodoActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match with_presenter(|presenter| {
        presenter.edit_task(task_id, TaskDraft::new(title, description))
    }) {
        Ok(()) => TodoActionResponse::success("Task updated.", Some(task_id.to_string())),
        Err(err) => TodoActionResponse::failure(format!("todo_edit failed: {err}")),
    }
}

/// Flips the completion flag. An unknown `id` is not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(id: String) -> TodoActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match with_presenter(|presenter| presenter.toggle_completed(task_id)) {
        Ok(()) => TodoActionResponse::success("Task toggled.", Some(task_id.to_string())),
        Err(err) => TodoActionResponse::failure(format!("todo_toggle failed: {err}")),
    }
}

/// Deletes one task. Deleting an absent task succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: String) -> TodoActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match with_presenter(|presenter| presenter.delete_task(task_id)) {
        Ok(()) => TodoActionResponse::success("Task deleted.", Some(task_id.to_string())),
        Err(err) => TodoActionResponse::failure(format!("todo_delete failed: {err}")),
    }
}

/// Removes every task. The next `todo_seed_if_empty` fetches again.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete_all() -> TodoActionResponse {
    match with_presenter(|presenter| presenter.reset_all()) {
        Ok(()) => TodoActionResponse::success("All tasks deleted.", None),
        Err(err) => TodoActionResponse::failure(format!("todo_delete_all failed: {err}")),
    }
}

/// Seeds an empty store from the remote todo list.
///
/// # FFI contract
/// - Blocks for the duration of the fetch; call off the UI thread.
/// - A non-empty store is left untouched and no request is made.
/// - Fetch failures return `ok=false` and leave the store empty.
pub fn todo_seed_if_empty() -> TodoActionResponse {
    let fetcher = match seed_fetcher() {
        Ok(fetcher) => fetcher,
        Err(message) => return TodoActionResponse::failure(message),
    };
    let seeded = with_presenter_using(fetcher, |presenter| {
        presenter.load_trackers();
        presenter.wait_for_seed();
        Ok((
            presenter.state(),
            presenter.count(),
            presenter.view_mut().last_error.take(),
        ))
    });

    match seeded {
        Ok((_, _, Some(error))) => {
            TodoActionResponse::failure(format!("todo_seed_if_empty failed: {error}"))
        }
        Ok((LoadState::Populated, count, None)) => {
            TodoActionResponse::success(format!("{count} task(s) available."), None)
        }
        Ok((_, _, None)) => TodoActionResponse::success("No tasks available.", None),
        Err(err) => TodoActionResponse::failure(format!("todo_seed_if_empty failed: {err}")),
    }
}

/// Share-sheet text for one task, returned in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_share_text(id: String) -> TodoActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match with_presenter(|presenter| presenter.store().get(task_id)) {
        Ok(Some(task)) => TodoActionResponse::success(task.share_text(), Some(task_id.to_string())),
        Ok(None) => TodoActionResponse::failure(format!("task not found: {task_id}")),
        Err(err) => TodoActionResponse::failure(format!("todo_share_text failed: {err}")),
    }
}

/// Headless view: the shell re-reads through `todo_list` after each call.
#[derive(Debug, Default)]
struct EnvelopeView {
    last_error: Option<String>,
}

impl TodoView for EnvelopeView {
    fn show_progress(&mut self, _shown: bool) {}

    fn update_table(&mut self) {}

    fn show_error(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
    }
}

/// Seed fetcher that refuses to run; used by calls that never seed.
struct NoSeed;

impl SeedFetcher for NoSeed {
    fn fetch_todos(&self) -> todolist_core::FetchResult<todolist_core::TodoListResponse> {
        Err(todolist_core::FetchError::Transport(
            "seeding is not available in this call".to_string(),
        ))
    }
}

fn app_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(|| {
        AppConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=error error={err}");
            AppConfig::default()
        })
    })
}

fn seed_fetcher() -> Result<Arc<HttpSeedFetcher>, String> {
    if let Some(fetcher) = SEED_FETCHER.get() {
        return Ok(Arc::clone(fetcher));
    }
    let fetcher = HttpSeedFetcher::new(app_config().todos_endpoint.clone())
        .map_err(|err| format!("seed client init failed: {err}"))?;
    Ok(Arc::clone(SEED_FETCHER.get_or_init(|| Arc::new(fetcher))))
}

fn with_presenter<T>(
    f: impl FnOnce(&mut Presenter<SqliteTaskRepository<'_>, EnvelopeView>) -> RepoResult<T>,
) -> Result<T, String> {
    with_presenter_using(Arc::new(NoSeed), f)
}

fn with_presenter_using<T>(
    fetcher: Arc<dyn SeedFetcher>,
    f: impl FnOnce(&mut Presenter<SqliteTaskRepository<'_>, EnvelopeView>) -> RepoResult<T>,
) -> Result<T, String> {
    let conn = open_db(&app_config().db_path).map_err(|err| format!("DB open failed: {err}"))?;
    let repo = SqliteTaskRepository::try_new(&conn)
        .map_err(|err| format!("task repo init failed: {err}"))?;
    let mut presenter = Presenter::new(TaskStore::new(repo), fetcher, EnvelopeView::default());
    f(&mut presenter).map_err(|err| err.to_string())
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid task id `{raw}`: {err}"))
}

fn to_item_view(task: &Task) -> TodoItemView {
    TodoItemView {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        created_date: task.created_date_label(),
        is_completed: task.is_completed,
    }
}
