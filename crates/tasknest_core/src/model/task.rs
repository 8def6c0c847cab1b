//! Task record and urgency levels.
//!
//! # Responsibility
//! - Define the single entity persisted by the task store.
//! - Provide the copy-and-flip helper used by the toggle flow.
//!
//! # Invariants
//! - `id == None` means "not yet persisted"; the store assigns it on insert.
//! - `name` is never blank once it passed `Task::validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned task identifier (SQLite rowid).
pub type TaskId = i64;

/// Priority level chosen when a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Every level, in ascending order.
    pub const ALL: [Urgency; 3] = [Urgency::Low, Urgency::Medium, Urgency::High];

    /// Persisted and display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Display for Urgency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name an urgency level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrgencyParseError(pub String);

impl Display for UrgencyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown urgency `{}`; expected Low|Medium|High",
            self.0
        )
    }
}

impl Error for UrgencyParseError {}

impl FromStr for Urgency {
    type Err = UrgencyParseError;

    /// Accepts the three labels case-insensitively, ignoring surrounding whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|urgency| urgency.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UrgencyParseError(trimmed.to_string()))
    }
}

/// Input rejected before it reaches the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyName,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name cannot be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// `None` until the store assigns an id.
    pub id: Option<TaskId>,
    pub name: String,
    pub urgency: Urgency,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Creates an unsaved, incomplete task.
    pub fn new(name: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            id: None,
            name: name.into(),
            urgency,
            completed: false,
        }
    }

    /// Returns the id if it refers to a stored row.
    ///
    /// Zero and negative ids are treated as unset, matching what SQLite
    /// `AUTOINCREMENT` can never hand out.
    pub fn stored_id(&self) -> Option<TaskId> {
        self.id.filter(|id| *id > 0)
    }

    /// Returns a full copy with `completed` flipped.
    ///
    /// Resubmitting the copy through upsert replaces the row because the id is kept.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    /// Whether the task still needs attention at high urgency.
    pub fn is_high_priority_open(&self) -> bool {
        self.urgency == Urgency::High && !self.completed
    }

    /// Checks presentation-level input rules.
    ///
    /// The store and repository accept any name; only UI entry points call this.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.name.trim().is_empty() {
            return Err(TaskValidationError::EmptyName);
        }
        Ok(())
    }
}
