//! FFI use-case API for the Flutter task screen.
//!
//! # Responsibility
//! - Expose the controller's list, counters and actions as sync calls.
//! - Reject invalid user input before it reaches the controller.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - One task session per process; it is bound to the first opened database.

use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tasknest_core::db::open_db;
use tasknest_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, SqliteTaskStore, Task,
    TaskController, TaskId, TaskObserver, TaskRepository, Urgency,
};
use tokio::runtime::Runtime;

const FIRST_SNAPSHOT_WAIT: Duration = Duration::from_secs(2);
const RUNTIME_WORKER_THREADS: usize = 2;

static SESSION: OnceCell<TaskSession> = OnceCell::new();

struct TaskSession {
    db_path: PathBuf,
    controller: TaskController,
    // Keeps the upstream subscription alive while the screen is open.
    observer: Mutex<TaskObserver>,
    _runtime: Runtime,
}

impl TaskSession {
    fn open(db_path: PathBuf) -> Result<Self, String> {
        let conn = open_db(&db_path).map_err(|err| format!("task DB open failed: {err}"))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_WORKER_THREADS)
            .thread_name("tasknest-worker")
            .enable_time()
            .build()
            .map_err(|err| format!("task runtime start failed: {err}"))?;

        let repository = TaskRepository::new(Arc::new(SqliteTaskStore::new(conn)));
        let controller = {
            let _guard = runtime.enter();
            TaskController::new(repository)
        };

        let mut observer = controller.observe();
        let first = runtime.block_on(async {
            tokio::time::timeout(FIRST_SNAPSHOT_WAIT, observer.changed()).await
        });
        if first.is_err() {
            warn!("event=tasks_open module=ffi status=slow first_snapshot=false");
        }
        info!("event=tasks_open module=ffi status=ok");

        Ok(Self {
            db_path,
            controller,
            observer: Mutex::new(observer),
            _runtime: runtime,
        })
    }

    fn current_tasks(&self) -> Vec<Task> {
        self.observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks()
    }

    fn find_task(&self, task_id: TaskId) -> Option<Task> {
        self.current_tasks()
            .into_iter()
            .find(|task| task.id == Some(task_id))
    }
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
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
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub name: String,
    /// `Low|Medium|High`.
    pub urgency: String,
    pub completed: bool,
}

/// Task list plus the counters shown above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub items: Vec<TaskItem>,
    pub total: u32,
    pub completed: u32,
    /// High urgency and not yet completed.
    pub high_priority_open: u32,
    /// Empty while the list is live; otherwise says why it may be stale.
    pub message: String,
}

impl TaskListResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            completed: 0,
            high_priority_open: 0,
            message: message.into(),
        }
    }
}

/// Result envelope for task actions.
///
/// `ok` means the action was accepted and queued; its effect appears in a
/// later [`tasks_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Target task id for toggle/delete; `None` for add (assigned later).
    pub task_id: Option<i64>,
    pub message: String,
}

impl TaskActionResponse {
    fn accepted(message: impl Into<String>, task_id: Option<i64>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Opens the task database and starts the live task list.
///
/// # FFI contract
/// - Sync call; blocks up to a few seconds for the first snapshot.
/// - Idempotent for the same path; a different path is rejected.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_open(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);

    match SESSION.get_or_try_init(|| TaskSession::open(requested.clone())) {
        Ok(session) if session.db_path == requested => String::new(),
        Ok(session) => format!(
            "tasks already opened at `{}`; refusing to switch to `{}`",
            session.db_path.display(),
            requested.display()
        ),
        Err(err) => err,
    }
}

/// Returns the current task list and counters.
///
/// # FFI contract
/// - Sync call, in-memory read.
/// - Never panics; reports a message when no session is open.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_snapshot() -> TaskListResponse {
    let Some(session) = SESSION.get() else {
        return TaskListResponse::failure("tasks_snapshot failed: tasks_open has not been called");
    };

    let tasks = session.current_tasks();
    let stats = tasknest_core::TaskStats::from_tasks(&tasks);
    let message = snapshot_message(
        session.controller.fault(),
        session.controller.is_subscribed(),
    );
    TaskListResponse {
        items: tasks.into_iter().filter_map(to_task_item).collect(),
        total: count_u32(stats.total),
        completed: count_u32(stats.completed),
        high_priority_open: count_u32(stats.high_priority_open),
        message,
    }
}

/// Queues a new task.
///
/// Input semantics:
/// - `name`: trimmed; blank names are rejected.
/// - `urgency`: `Low|Medium|High` (case-insensitive); `None` means `Medium`.
///
/// # FFI contract
/// - Sync call, returns before the write is persisted.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(name: String, urgency: Option<String>) -> TaskActionResponse {
    let urgency = match urgency.as_deref().map(str::parse::<Urgency>) {
        None => Urgency::default(),
        Some(Ok(urgency)) => urgency,
        Some(Err(err)) => return TaskActionResponse::rejected(format!("task_add failed: {err}")),
    };
    let task = Task::new(name.trim(), urgency);
    if let Err(err) = task.validate() {
        return TaskActionResponse::rejected(format!("task_add failed: {err}"));
    }

    with_session("task_add", |session| {
        session.controller.add_or_toggle(task);
        TaskActionResponse::accepted("Task queued.", None)
    })
}

/// Flips completion of the task with `task_id`.
///
/// # FFI contract
/// - Sync call, returns before the write is persisted.
/// - Unknown ids are rejected. Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: i64) -> TaskActionResponse {
    with_session("task_toggle", |session| match session.find_task(task_id) {
        Some(task) => {
            session.controller.toggle_completed(&task);
            TaskActionResponse::accepted("Task toggle queued.", Some(task_id))
        }
        None => TaskActionResponse::rejected(format!(
            "task_toggle failed: task not found: {task_id}"
        )),
    })
}

/// Deletes the task with `task_id`.
///
/// # FFI contract
/// - Sync call, returns before the write is persisted.
/// - Unknown ids are rejected. Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: i64) -> TaskActionResponse {
    with_session("task_delete", |session| match session.find_task(task_id) {
        Some(task) => {
            session.controller.remove(task);
            TaskActionResponse::accepted("Task delete queued.", Some(task_id))
        }
        None => TaskActionResponse::rejected(format!(
            "task_delete failed: task not found: {task_id}"
        )),
    })
}

fn with_session(
    op: &str,
    f: impl FnOnce(&TaskSession) -> TaskActionResponse,
) -> TaskActionResponse {
    match SESSION.get() {
        Some(session) => f(session),
        None => {
            TaskActionResponse::rejected(format!("{op} failed: tasks_open has not been called"))
        }
    }
}

fn to_task_item(task: Task) -> Option<TaskItem> {
    Some(TaskItem {
        id: task.stored_id()?,
        urgency: task.urgency.as_str().to_string(),
        name: task.name,
        completed: task.completed,
    })
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn snapshot_message(fault: Option<String>, subscribed: bool) -> String {
    match fault {
        Some(fault) => format!("task list is stale: {fault}; the next change retries"),
        None if !subscribed => "task list is stale: live updates are not running".to_string(),
        None => String::new(),
    }
}
