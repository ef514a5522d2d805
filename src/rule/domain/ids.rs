//! Identifier types for remote tracker resources.
//!
//! The tracker hands out opaque string identifiers (Asana calls them
//! "gids"). Each resource kind gets its own newtype so a section id can
//! never be passed where a workspace id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! tracker_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier, trimming surrounding whitespace.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                let raw: String = value.into();
                Self(raw.trim().to_owned())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

tracker_id!(
    /// Identifier of a workspace.
    WorkspaceId
);

tracker_id!(
    /// Identifier of a rule scope: a project or a user task list.
    ScopeId
);

tracker_id!(
    /// Identifier of a section inside a scope.
    SectionId
);

tracker_id!(
    /// Identifier of a task.
    TaskId
);

tracker_id!(
    /// Identifier of a user.
    UserId
);

/// Kinds of remote resources that can be looked up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// A workspace.
    Workspace,
    /// A project inside a workspace.
    Project,
    /// A section inside a project or user task list.
    Section,
    /// A user task list ("My Tasks").
    UserTaskList,
    /// A task.
    Task,
}

impl ResourceType {
    /// Returns the human-readable name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Project => "project",
            Self::Section => "section",
            Self::UserTaskList => "user task list",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
