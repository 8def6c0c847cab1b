//! Restartable stream of full-table snapshots.

use super::{StoreError, StoreResult, TaskStore};
use crate::model::task::Task;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Live view over the task table.
///
/// Nothing touches the store until the first [`LiveQuery::next`], which
/// yields the current contents. Every later call yields the table as it was
/// right after the next committed mutation. Dropping the query detaches it
/// from the store.
pub struct LiveQuery<S: TaskStore> {
    store: Arc<S>,
    receiver: Option<broadcast::Receiver<Vec<Task>>>,
}

impl<S: TaskStore> LiveQuery<S> {
    pub(crate) fn new(store: Arc<S>) -> Self {
        Self {
            store,
            receiver: None,
        }
    }

    /// Waits for the next snapshot.
    ///
    /// A query that fell more than the channel buffer behind restarts from the
    /// current table instead of replaying stale snapshots.
    ///
    /// # Errors
    /// - `StoreError::Sqlite` / `StoreError::InvalidData` when the table cannot be read.
    /// - `StoreError::Join` when the blocking read worker fails.
    pub async fn next(&mut self) -> StoreResult<Vec<Task>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return self.restart().await;
        };

        let received = receiver.recv().await;
        match received {
            Ok(snapshot) => Ok(snapshot),
            Err(RecvError::Lagged(skipped)) => {
                warn!("event=live_query_lagged module=store status=restart skipped={skipped}");
                self.restart().await
            }
            Err(RecvError::Closed) => Err(StoreError::Closed),
        }
    }

    /// Whether the query is currently attached to the store.
    pub fn is_attached(&self) -> bool {
        self.receiver.is_some()
    }

    async fn restart(&mut self) -> StoreResult<Vec<Task>> {
        self.receiver = None;
        let store = Arc::clone(&self.store);
        let subscription = tokio::task::spawn_blocking(move || store.subscribe()).await??;
        debug!(
            "event=live_query_start module=store status=ok rows={}",
            subscription.snapshot.len()
        );
        self.receiver = Some(subscription.receiver);
        Ok(subscription.snapshot)
    }
}
