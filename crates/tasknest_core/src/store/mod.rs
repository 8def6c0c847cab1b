//! Task store contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Durable CRUD over task rows.
//! - Fan out one full-table snapshot per committed mutation to live queries.
//!
//! # Invariants
//! - Mutations are serialized; no two writes interleave.
//! - A mutation and the snapshot describing it commit together or not at all.
//! - `update` and `delete` on an absent id are silent no-ops; `upsert` inserts.
//! - Snapshots are ordered by ascending id.

use crate::model::task::{Task, TaskId};
use std::sync::Arc;
use tokio::sync::broadcast;

mod live_query;
mod sqlite_store;

pub use crate::error::{StoreError, StoreResult};
pub use live_query::LiveQuery;
pub use sqlite_store::SqliteTaskStore;

/// Atomically captured starting point of a live query.
pub struct Subscription {
    /// Table contents at the moment the receiver was attached.
    pub snapshot: Vec<Task>,
    /// Yields one snapshot per mutation committed after `snapshot` was taken.
    pub receiver: broadcast::Receiver<Vec<Task>>,
}

/// Blocking task storage with change fan-out.
///
/// Implementations are shared behind `Arc` and called from tokio's blocking pool.
pub trait TaskStore: Send + Sync + 'static {
    /// Inserts when `task.id` is unset or unknown, otherwise replaces. Returns the row id.
    fn upsert(&self, task: &Task) -> StoreResult<TaskId>;
    /// Replaces the row with `task.id`; no-op when it does not exist.
    fn update(&self, task: &Task) -> StoreResult<()>;
    /// Removes the row with `task.id`; no-op when it does not exist.
    fn delete(&self, task: &Task) -> StoreResult<()>;
    /// Reads the whole table once.
    fn list_all(&self) -> StoreResult<Vec<Task>>;
    /// Reads the table and attaches a change receiver without a gap between the two.
    fn subscribe(&self) -> StoreResult<Subscription>;
    /// Number of attached change receivers.
    fn subscriber_count(&self) -> usize;

    /// Live sequence of full-table snapshots, starting with the current contents.
    fn query_all(self: Arc<Self>) -> LiveQuery<Self>
    where
        Self: Sized,
    {
        LiveQuery::new(self)
    }
}
