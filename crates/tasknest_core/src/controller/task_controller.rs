//! Task list controller and its observers.

use crate::model::stats::TaskStats;
use crate::model::task::Task;
use crate::repo::task_repo::TaskRepository;
use crate::store::{SqliteTaskStore, TaskStore};
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default delay between the last observer detaching and upstream teardown.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Controller tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long the upstream subscription outlives its last observer.
    pub grace_period: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Owns the rendered task list and routes user actions to the repository.
///
/// Cloning is cheap; clones share state and the upstream subscription.
pub struct TaskController<S: TaskStore = SqliteTaskStore> {
    inner: Arc<ControllerInner<S>>,
}

impl<S: TaskStore> Clone for TaskController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<S: TaskStore> {
    repository: TaskRepository<S>,
    state: Arc<watch::Sender<Vec<Task>>>,
    // Last upstream failure; cleared by the next delivered snapshot.
    fault: Arc<Mutex<Option<String>>>,
    sharing: Mutex<Sharing>,
    grace_period: Duration,
    runtime: Handle,
}

#[derive(Default)]
struct Sharing {
    observers: usize,
    upstream: Option<JoinHandle<()>>,
    teardown: Option<JoinHandle<()>>,
    // Bumped on every attach/detach; a teardown only fires for the generation
    // that scheduled it.
    generation: u64,
}

impl<S: TaskStore> TaskController<S> {
    /// Creates a controller with the default grace period.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime context.
    pub fn new(repository: TaskRepository<S>) -> Self {
        Self::with_config(repository, ControllerConfig::default())
    }

    /// Creates a controller with explicit tunables.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime context.
    pub fn with_config(repository: TaskRepository<S>, config: ControllerConfig) -> Self {
        Self::with_handle(repository, config, Handle::current())
    }

    /// Creates a controller whose background work runs on `runtime`.
    pub fn with_handle(
        repository: TaskRepository<S>,
        config: ControllerConfig,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(ControllerInner {
                repository,
                state: Arc::new(state),
                fault: Arc::new(Mutex::new(None)),
                sharing: Mutex::new(Sharing::default()),
                grace_period: config.grace_period,
                runtime,
            }),
        }
    }

    /// Attaches an observer, starting the upstream subscription if needed.
    ///
    /// The observer sees the latest known list immediately.
    pub fn observe(&self) -> TaskObserver<S> {
        let receiver = self.inner.state.subscribe();
        self.inner.attach();
        TaskObserver {
            receiver,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Latest known list, in store order.
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.state.borrow().clone()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.inner.state.borrow())
    }

    /// Whether the upstream live query is currently running.
    pub fn is_subscribed(&self) -> bool {
        let sharing = self.inner.lock_sharing();
        is_running(sharing.upstream.as_ref())
    }

    /// Why the upstream live query stopped, if it failed.
    ///
    /// While set, the list is stale. The next mutation restarts the
    /// subscription for attached observers.
    pub fn fault(&self) -> Option<String> {
        self.inner.fault()
    }

    /// Submits a new task, or a modified copy of an existing one, through upsert.
    ///
    /// Returns immediately; the outcome shows up in the next snapshot.
    pub fn add_or_toggle(&self, task: Task) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            let task_id = task.stored_id();
            if let Err(err) = inner.repository.add(task).await {
                error!("event=task_add module=controller status=error task_id={task_id:?} error={err}");
            }
            inner.resume_upstream();
        });
    }

    /// Flips `completed` on a copy of `task` and submits it.
    pub fn toggle_completed(&self, task: &Task) {
        self.add_or_toggle(task.toggled());
    }

    /// Submits a delete. Returns immediately.
    pub fn remove(&self, task: Task) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            let task_id = task.stored_id();
            if let Err(err) = inner.repository.delete(task).await {
                error!("event=task_remove module=controller status=error task_id={task_id:?} error={err}");
            }
            inner.resume_upstream();
        });
    }
}

impl<S: TaskStore> ControllerInner<S> {
    fn lock_sharing(&self) -> MutexGuard<'_, Sharing> {
        self.sharing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fault(&self) -> Option<String> {
        lock_fault(&self.fault).clone()
    }

    /// Restarts a failed upstream while observers are still attached.
    fn resume_upstream(&self) {
        let mut sharing = self.lock_sharing();
        if sharing.observers == 0 || is_running(sharing.upstream.as_ref()) {
            return;
        }
        sharing.upstream = Some(self.spawn_upstream());
        info!(
            "event=task_stream module=controller status=restart observers={}",
            sharing.observers
        );
    }

    fn attach(&self) {
        let mut sharing = self.lock_sharing();
        sharing.observers += 1;
        sharing.generation += 1;
        if let Some(teardown) = sharing.teardown.take() {
            teardown.abort();
            debug!("event=task_stream module=controller status=teardown_cancelled");
        }
        if !is_running(sharing.upstream.as_ref()) {
            sharing.upstream = Some(self.spawn_upstream());
            info!(
                "event=task_stream module=controller status=start observers={}",
                sharing.observers
            );
        }
    }

    fn detach(self: &Arc<Self>) {
        let mut sharing = self.lock_sharing();
        sharing.observers = sharing.observers.saturating_sub(1);
        if sharing.observers > 0 {
            return;
        }

        sharing.generation += 1;
        let generation = sharing.generation;
        let grace_period = self.grace_period;
        let inner = Arc::downgrade(self);
        sharing.teardown = Some(self.runtime.spawn(async move {
            tokio::time::sleep(grace_period).await;
            release_upstream(&inner, generation);
        }));
        debug!(
            "event=task_stream module=controller status=idle grace_ms={}",
            grace_period.as_millis()
        );
    }

    fn spawn_upstream(&self) -> JoinHandle<()> {
        let mut live = self.repository.tasks();
        let state = Arc::clone(&self.state);
        let fault = Arc::clone(&self.fault);
        self.runtime.spawn(async move {
            loop {
                match live.next().await {
                    Ok(snapshot) => {
                        debug!(
                            "event=task_snapshot module=controller status=ok rows={}",
                            snapshot.len()
                        );
                        lock_fault(&fault).take();
                        state.send_replace(snapshot);
                    }
                    Err(err) => {
                        error!("event=task_stream module=controller status=error error={err}");
                        *lock_fault(&fault) = Some(err.to_string());
                        // Wake observers so they can surface the stale list.
                        state.send_modify(|_| {});
                        break;
                    }
                }
            }
        })
    }
}

impl<S: TaskStore> Drop for ControllerInner<S> {
    fn drop(&mut self) {
        let sharing = self.sharing.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(upstream) = sharing.upstream.take() {
            upstream.abort();
        }
        if let Some(teardown) = sharing.teardown.take() {
            teardown.abort();
        }
    }
}

fn release_upstream<S: TaskStore>(inner: &Weak<ControllerInner<S>>, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut sharing = inner.lock_sharing();
    if sharing.observers > 0 || sharing.generation != generation {
        return;
    }
    sharing.teardown = None;
    if let Some(upstream) = sharing.upstream.take() {
        upstream.abort();
        info!("event=task_stream module=controller status=released");
    }
}

fn lock_fault(fault: &Mutex<Option<String>>) -> MutexGuard<'_, Option<String>> {
    fault.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_running(handle: Option<&JoinHandle<()>>) -> bool {
    handle.is_some_and(|handle| !handle.is_finished())
}

/// Attached view of the controller's task list.
///
/// Dropping the observer detaches it.
pub struct TaskObserver<S: TaskStore = SqliteTaskStore> {
    receiver: watch::Receiver<Vec<Task>>,
    inner: Arc<ControllerInner<S>>,
}

impl<S: TaskStore> TaskObserver<S> {
    /// Latest list, in store order.
    pub fn tasks(&self) -> Vec<Task> {
        self.receiver.borrow().clone()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.receiver.borrow())
    }

    /// Upstream failure that left this list stale, if any.
    pub fn fault(&self) -> Option<String> {
        self.inner.fault()
    }

    /// Waits until the list changes after the last call (or after attaching).
    pub async fn changed(&mut self) {
        // The sender lives in `inner`, which this observer keeps alive.
        let _ = self.receiver.changed().await;
    }
}

impl<S: TaskStore> Drop for TaskObserver<S> {
    fn drop(&mut self) {
        self.inner.detach();
    }
}
