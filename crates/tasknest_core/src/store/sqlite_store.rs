//! SQLite-backed task store.

use super::{StoreError, StoreResult, Subscription, TaskStore};
use crate::model::task::{Task, TaskId, Urgency};
use log::{debug, error};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const TASK_SELECT_SQL: &str = "SELECT id, name, urgency, completed FROM tasks ORDER BY id ASC";
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Task store over one SQLite connection.
///
/// The connection mutex is the single-writer gate. Snapshots are read inside
/// the writing transaction while the gate is held, so live queries observe
/// mutations in commit order.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<Vec<Task>>,
}

impl SqliteTaskStore {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            conn: Mutex::new(conn),
            changes,
        }
    }

    // A panic mid-statement leaves SQLite itself consistent, so the poisoned
    // guard is still usable.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `write` in a transaction and, when live queries are attached,
    /// reads the resulting table inside the same transaction.
    ///
    /// The write commits only if that read succeeds, so a committed mutation
    /// always has exactly one published snapshot and a failed call leaves the
    /// table untouched.
    fn mutate<T>(
        &self,
        op: &'static str,
        write: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;
        let value = write(&tx)?;

        let snapshot = if self.changes.receiver_count() > 0 {
            let snapshot = select_all(&tx).map_err(|err| {
                error!("event=task_publish module=store status=error op={op} rolled_back=true error={err}");
                err
            })?;
            Some(snapshot)
        } else {
            None
        };
        tx.commit()?;

        if let Some(snapshot) = snapshot {
            let rows = snapshot.len();
            if let Ok(receivers) = self.changes.send(snapshot) {
                debug!("event=task_publish module=store status=ok op={op} rows={rows} receivers={receivers}");
            }
        }
        Ok(value)
    }
}

impl TaskStore for SqliteTaskStore {
    fn upsert(&self, task: &Task) -> StoreResult<TaskId> {
        let id = self.mutate("upsert", |tx| {
            let urgency = task.urgency.as_str();
            let completed = bool_to_int(task.completed);
            match task.stored_id() {
                None => {
                    tx.execute(
                        "INSERT INTO tasks (name, urgency, completed) VALUES (?1, ?2, ?3);",
                        params![task.name.as_str(), urgency, completed],
                    )?;
                    Ok(tx.last_insert_rowid())
                }
                Some(id) => {
                    tx.execute(
                        "INSERT INTO tasks (id, name, urgency, completed) VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(id) DO UPDATE SET
                            name = excluded.name,
                            urgency = excluded.urgency,
                            completed = excluded.completed;",
                        params![id, task.name.as_str(), urgency, completed],
                    )?;
                    Ok(id)
                }
            }
        })?;
        debug!(
            "event=task_upsert module=store status=ok task_id={id} assigned={}",
            task.stored_id().is_none()
        );
        Ok(id)
    }

    fn update(&self, task: &Task) -> StoreResult<()> {
        let changed = self.mutate("update", |tx| match task.stored_id() {
            Some(id) => Ok(tx.execute(
                "UPDATE tasks SET name = ?1, urgency = ?2, completed = ?3 WHERE id = ?4;",
                params![
                    task.name.as_str(),
                    task.urgency.as_str(),
                    bool_to_int(task.completed),
                    id
                ],
            )?),
            None => Ok(0),
        })?;
        debug!(
            "event=task_update module=store status=ok task_id={:?} changed={changed}",
            task.stored_id()
        );
        Ok(())
    }

    fn delete(&self, task: &Task) -> StoreResult<()> {
        let changed = self.mutate("delete", |tx| match task.stored_id() {
            Some(id) => Ok(tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?),
            None => Ok(0),
        })?;
        debug!(
            "event=task_delete module=store status=ok task_id={:?} changed={changed}",
            task.stored_id()
        );
        Ok(())
    }

    fn list_all(&self) -> StoreResult<Vec<Task>> {
        let conn = self.lock_conn();
        select_all(&conn)
    }

    fn subscribe(&self) -> StoreResult<Subscription> {
        let conn = self.lock_conn();
        let snapshot = select_all(&conn)?;
        let receiver = self.changes.subscribe();
        debug!(
            "event=task_subscribe module=store status=ok rows={} receivers={}",
            snapshot.len(),
            self.changes.receiver_count()
        );
        Ok(Subscription { snapshot, receiver })
    }

    fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }
}

fn select_all(conn: &Connection) -> StoreResult<Vec<Task>> {
    let mut stmt = conn.prepare_cached(TASK_SELECT_SQL)?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id: TaskId = row.get("id")?;

    let urgency_text: String = row.get("urgency")?;
    let urgency = urgency_text.parse::<Urgency>().map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid urgency `{urgency_text}` in tasks.urgency for id {id}"
        ))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed for id {id}"
            )));
        }
    };

    Ok(Task {
        id: Some(id),
        name: row.get("name")?,
        urgency,
        completed,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
