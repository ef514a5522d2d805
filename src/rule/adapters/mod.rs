//! Task tracker adapters.

pub mod asana;
pub mod memory;

pub use asana::AsanaTaskTracker;
pub use memory::{InMemoryTaskTracker, RecordedMove};
