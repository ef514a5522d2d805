//! Wire shapes of the Asana REST API.

use crate::rule::domain::{SectionId, Task, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub(super) data: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct Page<T> {
    pub(super) data: Vec<T>,
    #[serde(default)]
    pub(super) next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NextPage {
    pub(super) offset: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GidRecord {
    pub(super) gid: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct NamedRecord {
    pub(super) gid: String,
    #[serde(default)]
    pub(super) name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SectionRecord {
    #[serde(default)]
    pub(super) project: Option<GidRecord>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MembershipRecord {
    #[serde(default)]
    section: Option<GidRecord>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TaskRecord {
    gid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    due_on: Option<NaiveDate>,
    #[serde(default)]
    due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    memberships: Vec<MembershipRecord>,
}

impl TaskRecord {
    pub(super) fn into_task(self) -> Task {
        let mut task = Task::new(TaskId::new(self.gid), self.name.unwrap_or_default())
            .with_completed(self.completed);
        if let Some(date) = self.due_on {
            task = task.with_due_on(date);
        }
        if let Some(instant) = self.due_at {
            task = task.with_due_at(instant);
        }
        self.memberships
            .into_iter()
            .filter_map(|membership| membership.section)
            .fold(task, |acc, section| acc.in_section(SectionId::new(section.gid)))
    }
}
