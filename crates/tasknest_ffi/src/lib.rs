//! Flutter-facing bindings for the TaskNest core.

pub mod api;
