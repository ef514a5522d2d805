//! Asana-backed task tracker.

mod client;
mod models;

pub use client::{AsanaTaskTracker, DEFAULT_BASE_URL, StatusError};
