//! Task domain model.
//!
//! # Invariants
//! - A persisted task is identified by a store-assigned, never reused `TaskId`.
//! - Urgency is always one of the `Urgency` variants.

pub mod stats;
pub mod task;
