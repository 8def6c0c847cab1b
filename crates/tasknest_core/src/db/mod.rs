//! Task database bootstrap: connection setup plus schema migrations.
//!
//! Nothing reads or writes `tasks` before [`migrations::apply_migrations`]
//! succeeded on the connection.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
