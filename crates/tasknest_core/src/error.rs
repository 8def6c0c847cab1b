//! Crate-wide storage error.
//!
//! Every fault is fatal to the operation in flight; nothing in the pipeline
//! retries. Logical no-ops (update/delete of an absent id) are not errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// SQLite rejected a statement or the file could not be opened.
    Sqlite(rusqlite::Error),
    /// The database file was migrated by a newer build.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// A persisted row does not map onto a `Task`.
    InvalidData(String),
    /// The blocking worker running the SQLite call panicked or was cancelled.
    Join(String),
    /// The snapshot channel shut down under a live query.
    Closed,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "task database is at schema v{found}, this build only knows up to v{supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::Join(message) => write!(f, "store worker failed: {message}"),
            Self::Closed => write!(f, "task snapshot channel closed"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value.to_string())
    }
}
