//! Port contracts for rule evaluation.
//!
//! Rules only reach the remote tracker through [`TaskTracker`].

pub mod tracker;

#[cfg(test)]
pub use tracker::MockTaskTracker;
pub use tracker::{LookupScope, TaskQuery, TaskTracker, TrackerError, TrackerResult, UserRef};
