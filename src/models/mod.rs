//! Data models for the attendance tracker.
//!
//! Field names serialize in camelCase to match the browser client.

mod attendance;
mod change_log;
mod datastore;
mod employee;
mod holiday;

pub use attendance::*;
pub use change_log::*;
pub use datastore::*;
pub use employee::*;
pub use holiday::*;
