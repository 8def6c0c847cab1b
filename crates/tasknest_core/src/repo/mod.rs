//! Repository layer between the view-state controller and the task store.
//!
//! # Invariants
//! - Repository adds no validation, retries or transformation.
//! - Blocking SQLite work never runs on the caller's async worker.

pub mod task_repo;
