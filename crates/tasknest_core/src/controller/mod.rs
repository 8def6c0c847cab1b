//! UI-facing view state derived from the repository's live snapshots.
//!
//! # Responsibility
//! - Hold the list the presentation layer renders.
//! - Turn user actions into fire-and-forget repository writes.
//! - Share one upstream subscription among all observers.
//!
//! # Invariants
//! - The upstream live query runs only while observers are attached, plus a
//!   grace period after the last one detaches.
//! - State starts empty and keeps its last snapshot across teardown.

pub mod task_controller;
