//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `tasks` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Listing order is `created_at DESC, rowid DESC` (newest insert wins ties).

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::task::{Task, TaskId, TaskValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    created_at,
    is_completed
FROM tasks";

const TASK_COLUMNS: [&str; 5] = ["id", "title", "description", "created_at", "is_completed"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    /// Storage read/write failure.
    Persistence(DbError),
    NotFound(TaskId),
    /// View row requested beyond the filtered count.
    IndexOutOfRange {
        index: usize,
        count: usize,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::IndexOutOfRange { index, count } => {
                write!(f, "row {index} is out of range for {count} visible task(s)")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Case-insensitive substring filter on `title`. `None` or empty lists all.
    pub title_contains: Option<String>,
}

impl TaskListQuery {
    pub fn with_title_filter(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            title_contains: (!text.is_empty()).then_some(text),
        }
    }
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Full replace of mutable fields. Absent id yields `NotFound`.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Total row count, ignoring any filter.
    fn count_tasks(&self) -> RepoResult<u64>;
    /// Returns whether a row was removed.
    fn delete_task(&self, id: TaskId) -> RepoResult<bool>;
    /// Returns the number of removed rows.
    fn delete_all_tasks(&self) -> RepoResult<usize>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections that skipped `open_db` bootstrap.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                created_at,
                is_completed
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.created_at,
                bool_to_int(task.is_completed),
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                created_at = ?3,
                is_completed = ?4
             WHERE id = ?5;",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.created_at,
                bool_to_int(task.is_completed),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let needle = query.title_contains.as_deref().unwrap_or_default();
        let mut tasks = Vec::new();

        // Filtering happens here rather than in SQL: SQLite `lower()` only
        // folds ASCII, and titles are routinely non-Latin.
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            if task.title_contains(needle) {
                tasks.push(task);
            }
        }

        Ok(tasks)
    }

    fn count_tasks(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative task count `{count}`")))
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn delete_all_tasks(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM tasks;", [])?;
        Ok(changed)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id")))?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        is_completed,
    };
    task.validate()?;
    Ok(task)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "tasks")? {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    for column in TASK_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
