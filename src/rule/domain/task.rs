//! Read-only task snapshot as supplied by the tracker.

use super::{SectionId, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Due information for a task.
///
/// A due time always implies a due date, so the time-bearing variant wins
/// when the tracker reports both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskDue {
    /// The task has no due date.
    None,
    /// The task is due on a date, with no time of day.
    On {
        /// Due date in the user's calendar.
        date: NaiveDate,
    },
    /// The task is due at an exact instant.
    At {
        /// Due instant.
        instant: DateTime<Utc>,
    },
}

/// Task as observed in a remote scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    completed: bool,
    due_on: Option<NaiveDate>,
    due_at: Option<DateTime<Utc>>,
    section_ids: Vec<SectionId>,
}

impl Task {
    /// Creates an incomplete task without due information or sections.
    #[must_use]
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: false,
            due_on: None,
            due_at: None,
            section_ids: Vec::new(),
        }
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_on(mut self, date: NaiveDate) -> Self {
        self.due_on = Some(date);
        self
    }

    /// Sets the due instant.
    #[must_use]
    pub const fn with_due_at(mut self, instant: DateTime<Utc>) -> Self {
        self.due_at = Some(instant);
        self
    }

    /// Marks the task completed or not.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Adds a section membership.
    #[must_use]
    pub fn in_section(mut self, section_id: impl Into<SectionId>) -> Self {
        self.section_ids.push(section_id.into());
        self
    }

    /// Replaces any membership among `siblings` with `section_id`.
    ///
    /// Memberships in other scopes are kept.
    pub fn relocate(&mut self, siblings: &BTreeSet<SectionId>, section_id: SectionId) {
        self.section_ids.retain(|current| !siblings.contains(current));
        self.section_ids.push(section_id);
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the task is completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns the sections the task currently belongs to.
    #[must_use]
    pub fn section_ids(&self) -> &[SectionId] {
        &self.section_ids
    }

    /// Returns whether the task belongs to the given section.
    #[must_use]
    pub fn is_in_section(&self, section_id: &SectionId) -> bool {
        self.section_ids.contains(section_id)
    }

    /// Returns the effective due information.
    #[must_use]
    pub const fn due(&self) -> TaskDue {
        match (self.due_at, self.due_on) {
            (Some(instant), _) => TaskDue::At { instant },
            (None, Some(date)) => TaskDue::On { date },
            (None, None) => TaskDue::None,
        }
    }
}
