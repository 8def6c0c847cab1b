//! Async facade over a [`TaskStore`].

use crate::model::task::{Task, TaskId};
use crate::store::{LiveQuery, SqliteTaskStore, StoreResult, TaskStore};
use std::sync::Arc;

/// The only persistence API the controller sees.
pub struct TaskRepository<S: TaskStore = SqliteTaskStore> {
    store: Arc<S>,
}

impl<S: TaskStore> Clone for TaskRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskStore> TaskRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Live snapshots of every task, straight from the store.
    pub fn tasks(&self) -> LiveQuery<S> {
        Arc::clone(&self.store).query_all()
    }

    /// Upserts `task`; returns the id it is stored under.
    pub async fn add(&self, task: Task) -> StoreResult<TaskId> {
        self.run(move |store| store.upsert(&task)).await
    }

    pub async fn update(&self, task: Task) -> StoreResult<()> {
        self.run(move |store| store.update(&task)).await
    }

    pub async fn delete(&self, task: Task) -> StoreResult<()> {
        self.run(move |store| store.delete(&task)).await
    }

    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store)).await?
    }
}
