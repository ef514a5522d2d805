//! Unit tests for rule evaluation.

mod due_window_tests;
mod timeframe_tests;
