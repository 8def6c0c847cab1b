//! Core of the TaskNest to-do app.
//!
//! Persistence-to-presentation pipeline: SQLite task store, async
//! repository facade, and a view-state controller that keeps the UI list in
//! sync with every committed write.

pub mod controller;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use controller::task_controller::{
    ControllerConfig, TaskController, TaskObserver, DEFAULT_GRACE_PERIOD,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::stats::TaskStats;
pub use model::task::{Task, TaskId, TaskValidationError, Urgency, UrgencyParseError};
pub use repo::task_repo::TaskRepository;
pub use store::{LiveQuery, SqliteTaskStore, StoreError, StoreResult, Subscription, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
