//! Persistent state database (SQLite via sqlx).
//!
//! Holds the scheduler's metrics preferences (a small key/value table with
//! stable key names) and the pending job descriptors of the platform stand-in.

pub mod types;
pub mod db;
mod jobs;
mod prefs;

pub use types::*;
pub use db::*;

#[cfg(test)]
mod tests;
