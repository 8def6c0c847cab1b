//! Schema migrations for the task database.
//!
//! Versions are strictly increasing and the applied one is stored in
//! `PRAGMA user_version`. Pending steps commit together or not at all.

use crate::error::{StoreError, StoreResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs in apply order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_tasks.sql"))];

/// Newest schema version this build can create.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |&(version, _)| version)
}

/// Version currently recorded in the database header.
pub fn schema_version(conn: &Connection) -> StoreResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `StoreError::UnsupportedSchemaVersion` for a file written by a newer build.
/// - `StoreError::Sqlite` when a step fails; the schema is left untouched then.
pub fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(StoreError::UnsupportedSchemaVersion { found, supported });
    }

    let pending: Vec<_> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={found} to_version={supported} steps={}",
        pending.len()
    );
    Ok(())
}
