//! Core domain logic for the to-do list app.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{now_epoch_ms, Task, TaskDraft, TaskId, TaskValidationError};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListQuery, TaskRepository,
};
pub use seed::fetcher::{
    decode_todo_list, FetchError, FetchResult, HttpSeedFetcher, SeedFetcher,
    DEFAULT_TODOS_ENDPOINT,
};
pub use seed::wire::{remote_task_id, TodoItem, TodoListResponse};
pub use service::presenter::{LoadState, Presenter, TodoView};
pub use service::task_store::TaskStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
