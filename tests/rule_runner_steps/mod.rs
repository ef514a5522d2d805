//! Step definitions for rule runner scenarios.

mod given;
mod then;
mod when;
pub mod world;
