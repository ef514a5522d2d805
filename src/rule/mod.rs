//! Rule evaluation for task hygiene.
//!
//! Rules are read from configuration, validated, synchronized with the
//! remote tracker, and then executed or simulated. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]: timeframes, due windows, section selection
//! - Port contracts in [`ports`]: the [`ports::TaskTracker`] collaborator
//! - Adapter implementations in [`adapters`]: in-memory and Asana
//! - Orchestration services in [`services`]: rule lifecycle and runner

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
