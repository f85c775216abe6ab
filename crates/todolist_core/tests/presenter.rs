use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use todolist_core::db::open_db_in_memory;
use todolist_core::{
    remote_task_id, FetchError, FetchResult, LoadState, Presenter, RepoError, SeedFetcher,
    SqliteTaskRepository, Task, TaskDraft, TaskStore, TodoItem, TodoListResponse, TodoView,
};
use uuid::Uuid;

#[derive(Default)]
struct SpyView {
    progress: Vec<bool>,
    table_updates: usize,
    errors: Vec<String>,
}

impl TodoView for SpyView {
    fn show_progress(&mut self, shown: bool) {
        self.progress.push(shown);
    }

    fn update_table(&mut self) {
        self.table_updates += 1;
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

struct StubFetcher {
    result: FetchResult<TodoListResponse>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn returning(result: FetchResult<TodoListResponse>) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SeedFetcher for StubFetcher {
    fn fetch_todos(&self) -> FetchResult<TodoListResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Holds the fetch until the test releases it.
struct GatedFetcher {
    gate: Mutex<Receiver<()>>,
    finished: AtomicUsize,
}

impl GatedFetcher {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let fetcher = Arc::new(Self {
            gate: Mutex::new(rx),
            finished: AtomicUsize::new(0),
        });
        (fetcher, tx)
    }
}

impl SeedFetcher for GatedFetcher {
    fn fetch_todos(&self) -> FetchResult<TodoListResponse> {
        let _ = self.gate.lock().unwrap().recv();
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(three_todos())
    }
}

fn three_todos() -> TodoListResponse {
    let item = |id, todo: &str, completed| TodoItem {
        id,
        todo: todo.to_string(),
        completed,
        user_id: 1,
    };
    TodoListResponse {
        total: 3,
        skip: 0,
        limit: 3,
        todos: vec![item(1, "A", false), item(2, "B", true), item(3, "C", false)],
    }
}

fn presenter(
    conn: &Connection,
    fetcher: Arc<dyn SeedFetcher>,
) -> Presenter<SqliteTaskRepository<'_>, SpyView> {
    let store = TaskStore::new(SqliteTaskRepository::try_new(conn).unwrap());
    Presenter::new(store, fetcher, SpyView::default())
}

fn seeded_presenter(conn: &Connection) -> Presenter<SqliteTaskRepository<'_>, SpyView> {
    let mut presenter = presenter(conn, StubFetcher::returning(Ok(three_todos())));
    presenter.load_trackers();
    presenter.wait_for_seed();
    presenter
}

#[test]
fn empty_store_is_seeded_from_the_fetcher() {
    let conn = open_db_in_memory().unwrap();
    let fetcher = StubFetcher::returning(Ok(three_todos()));
    let mut presenter = presenter(&conn, fetcher.clone());

    presenter.load_trackers();
    assert_eq!(presenter.state(), LoadState::Loading);
    presenter.wait_for_seed();

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(presenter.state(), LoadState::Populated);
    assert_eq!(presenter.count(), 3);
    assert!(!presenter.store().is_empty());

    let mut titles: Vec<String> = presenter
        .list_all()
        .into_iter()
        .map(|task| task.title)
        .collect();
    titles.sort();
    assert_eq!(titles, ["A", "B", "C"]);

    let b = presenter
        .list_all()
        .into_iter()
        .find(|task| task.title == "B")
        .unwrap();
    assert!(b.is_completed);
    assert_eq!(b.id, remote_task_id(2));

    assert_eq!(presenter.view().progress, [true, false]);
    assert_eq!(presenter.view().table_updates, 1);
}

#[test]
fn non_empty_store_never_calls_the_fetcher() {
    let conn = open_db_in_memory().unwrap();
    {
        let mut store = TaskStore::new(SqliteTaskRepository::try_new(&conn).unwrap());
        store.create(&Task::new("already here", "", 1)).unwrap();
    }

    let fetcher = StubFetcher::returning(Ok(three_todos()));
    let mut presenter = presenter(&conn, fetcher.clone());
    presenter.load_trackers();
    presenter.wait_for_seed();

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(presenter.state(), LoadState::Populated);
    assert_eq!(presenter.count(), 1);
    assert!(presenter.view().progress.is_empty());
    assert_eq!(presenter.view().table_updates, 1);
}

#[test]
fn fetch_failure_leaves_an_empty_list_without_retry() {
    let conn = open_db_in_memory().unwrap();
    let fetcher = StubFetcher::returning(Err(FetchError::HttpStatus(503)));
    let mut presenter = presenter(&conn, fetcher.clone());

    presenter.load_trackers();
    presenter.wait_for_seed();

    assert_eq!(presenter.state(), LoadState::Empty);
    assert_eq!(presenter.count(), 0);
    assert!(presenter.store().is_empty());
    assert_eq!(presenter.view().progress, [true, false]);
    assert_eq!(presenter.view().table_updates, 1);
    assert_eq!(presenter.view().errors.len(), 1);
    assert!(presenter.view().errors[0].contains("503"));

    presenter.update_search_text("anything");
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn poll_seed_applies_the_result_only_once_it_arrives() {
    let conn = open_db_in_memory().unwrap();
    let (fetcher, release) = GatedFetcher::new();
    let mut presenter = presenter(&conn, fetcher);

    presenter.load_trackers();
    assert!(!presenter.poll_seed());
    assert_eq!(presenter.count(), 0);

    // A second load while loading must not start another fetch.
    presenter.load_trackers();
    assert_eq!(presenter.view().progress, [true]);

    release.send(()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !presenter.poll_seed() {
        assert!(Instant::now() < deadline, "seed result never arrived");
        std::thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(presenter.count(), 3);
    assert_eq!(presenter.state(), LoadState::Populated);
    assert!(!presenter.poll_seed());
}

#[test]
fn dropping_the_presenter_mid_fetch_discards_the_result() {
    let conn = open_db_in_memory().unwrap();
    let (fetcher, release) = GatedFetcher::new();
    let mut presenter = presenter(&conn, fetcher.clone());

    presenter.load_trackers();
    drop(presenter);
    release.send(()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while fetcher.finished.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "fetch never finished");
        std::thread::sleep(Duration::from_millis(5));
    }

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn toggle_flips_completion_and_keeps_text() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);
    let id = remote_task_id(1);

    presenter.toggle_completed(id).unwrap();

    let toggled = presenter
        .list_all()
        .into_iter()
        .find(|task| task.id == id)
        .unwrap();
    assert!(toggled.is_completed);
    assert_eq!(toggled.title, "A");
    assert_eq!(toggled.description, "A");
}

#[test]
fn toggle_of_unknown_id_is_benign() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);
    let updates_before = presenter.view().table_updates;

    presenter.toggle_completed(Uuid::new_v4()).unwrap();
    assert_eq!(presenter.count(), 3);
    assert_eq!(presenter.view().table_updates, updates_before + 1);
}

#[test]
fn search_text_is_forwarded_to_the_store() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);

    presenter.update_search_text("b");
    assert_eq!(presenter.store().search_text(), "b");
    assert_eq!(presenter.count(), 1);
    assert_eq!(presenter.object_at(0).unwrap().title, "B");

    presenter.update_search_text("");
    assert_eq!(presenter.count(), 3);
}

#[test]
fn created_task_appears_at_the_top() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);

    let created = presenter
        .create_task(TaskDraft::new("Plan trip", "book hotel"))
        .unwrap();
    assert!(!created.is_completed);
    assert_eq!(presenter.count(), 4);
    assert_eq!(presenter.object_at(0).unwrap().id, created.id);
}

#[test]
fn create_rejects_blank_title_and_still_redraws() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = presenter(&conn, StubFetcher::returning(Ok(three_todos())));

    let err = presenter.create_task(TaskDraft::new(" ", "body")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(presenter.count(), 0);
    assert_eq!(presenter.view().table_updates, 1);
    assert_eq!(presenter.state(), LoadState::Idle);
}

#[test]
fn edit_replaces_text_and_moves_task_to_the_top() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);

    // Push the seeded rows into the past so the edit timestamp is strictly newer.
    conn.execute("UPDATE tasks SET created_at = 1;", []).unwrap();
    presenter.update_search_text("");

    let id = remote_task_id(3);
    presenter
        .edit_task(id, TaskDraft::new("C edited", "details"))
        .unwrap();

    let top = presenter.object_at(0).unwrap();
    assert_eq!(top.id, id);
    assert_eq!(top.title, "C edited");
    assert_eq!(top.description, "details");
    assert!(top.created_at > 1);
}

#[test]
fn edit_of_unknown_id_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);
    let before = presenter.list_all();

    presenter
        .edit_task(Uuid::new_v4(), TaskDraft::new("ghost", ""))
        .unwrap();
    assert_eq!(presenter.list_all(), before);
}

#[test]
fn delete_at_removes_the_visible_row() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);

    presenter.update_search_text("a");
    presenter.delete_at(0).unwrap();
    presenter.update_search_text("");

    assert_eq!(presenter.count(), 2);
    assert!(presenter.list_all().iter().all(|task| task.title != "A"));

    let err = presenter.delete_at(5).unwrap_err();
    assert!(matches!(err, RepoError::IndexOutOfRange { index: 5, count: 2 }));
}

#[test]
fn share_text_describes_the_row() {
    let conn = open_db_in_memory().unwrap();
    let mut presenter = seeded_presenter(&conn);

    presenter.update_search_text("c");
    assert_eq!(
        presenter.share_text_at(0).unwrap(),
        "Task: C\nDescription: C"
    );
}

#[test]
fn reset_all_empties_the_store_and_allows_reseeding() {
    let conn = open_db_in_memory().unwrap();
    let fetcher = StubFetcher::returning(Ok(three_todos()));
    let mut presenter = presenter(&conn, fetcher.clone());
    presenter.load_trackers();
    presenter.wait_for_seed();

    presenter.reset_all().unwrap();
    presenter.reset_all().unwrap();
    assert_eq!(presenter.count(), 0);
    assert!(presenter.store().is_empty());
    assert_eq!(presenter.state(), LoadState::Idle);

    presenter.load_trackers();
    presenter.wait_for_seed();
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(presenter.count(), 3);
}

#[test]
fn reset_while_loading_discards_the_in_flight_seed() {
    let conn = open_db_in_memory().unwrap();
    let (fetcher, release) = GatedFetcher::new();
    let mut presenter = presenter(&conn, fetcher.clone());

    presenter.load_trackers();
    presenter.reset_all().unwrap();
    assert_eq!(presenter.state(), LoadState::Idle);
    assert_eq!(presenter.view().progress, [true, false]);

    release.send(()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while fetcher.finished.load(Ordering::SeqCst) == 0 {
        assert!(Instant::now() < deadline, "fetch never finished");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!presenter.poll_seed());
    presenter.wait_for_seed();
    assert_eq!(presenter.count(), 0);
    assert!(presenter.store().is_empty());
    assert_eq!(presenter.state(), LoadState::Idle);

    // The next load starts exactly one fresh fetch and balances the indicator.
    presenter.load_trackers();
    release.send(()).unwrap();
    presenter.wait_for_seed();
    assert_eq!(fetcher.finished.load(Ordering::SeqCst), 2);
    assert_eq!(presenter.count(), 3);
    assert_eq!(presenter.state(), LoadState::Populated);
    assert_eq!(presenter.view().progress, [true, false, true, false]);
}

#[test]
fn duplicate_remote_ids_are_skipped_not_fatal() {
    let conn = open_db_in_memory().unwrap();
    let mut response = three_todos();
    response.todos.push(response.todos[0].clone());
    let mut presenter = presenter(&conn, StubFetcher::returning(Ok(response)));

    presenter.load_trackers();
    presenter.wait_for_seed();

    assert_eq!(presenter.state(), LoadState::Populated);
    assert_eq!(presenter.count(), 3);
}
