//! Domain model for rule evaluation.
//!
//! Timeframe parsing and resolution, due windows, section selection and the
//! read-only task snapshot. Nothing here talks to the remote tracker.

mod due_window;
mod error;
mod ids;
mod insert;
mod sections;
mod task;
mod timeframe;

pub use due_window::{DueWindow, ResolvedDueWindow, WindowEdge, build_due_window};
pub use error::{DueWindowError, LookupError, SectionResolutionError, TimeframeError};
pub use ids::{ResourceType, ScopeId, SectionId, TaskId, UserId, WorkspaceId};
pub use insert::{InsertPosition, ParseInsertPositionError};
pub use sections::{SectionSelector, find_unique_id_by_name, resolve_allowed_sections};
pub use task::{Task, TaskDue};
pub use timeframe::{BoundEdge, DueBound, TimeUnit, Timeframe, parse_timeframe, resolve_bound};
