//! Tasksweep: rule-driven task hygiene for remote project trackers.
//!
//! Rules declared in a configuration file move tasks between sections based
//! on how soon they are due and which section they currently sit in.
//!
//! # Architecture
//!
//! Tasksweep follows hexagonal architecture principles:
//!
//! - **Domain**: timeframe and section resolution with no I/O
//! - **Ports**: the task tracker contract rules depend on
//! - **Adapters**: in-memory and Asana implementations of that contract
//!
//! # Modules
//!
//! - [`rule`]: rule lifecycle, move-tasks rule, and the runner
//! - [`config`]: rules and secrets files

pub mod config;
pub mod rule;
