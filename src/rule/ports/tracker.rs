//! Task tracker port: the remote collaborator rules read from and move
//! tasks through.

use crate::rule::domain::{
    InsertPosition, LookupError, ResolvedDueWindow, ResourceType, ScopeId, SectionId, Task,
    TaskId, UserId, WorkspaceId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// The user whose task list is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    /// The user the tracker credentials belong to.
    Me,
    /// An explicit user.
    Id(UserId),
}

impl UserRef {
    /// Returns the identifier the remote API expects for this user.
    #[must_use]
    pub fn as_api_str(&self) -> &str {
        match self {
            Self::Me => "me",
            Self::Id(id) => id.as_str(),
        }
    }
}

/// Container searched when resolving a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupScope {
    /// Every resource visible to the credentials; used for workspaces.
    Global,
    /// Resources inside a workspace; used for projects.
    Workspace(WorkspaceId),
    /// Resources inside a project or user task list; used for sections.
    Scope(ScopeId),
}

impl LookupScope {
    /// Returns the parent identifier, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Workspace(id) => Some(id.as_str()),
            Self::Scope(id) => Some(id.as_str()),
        }
    }
}

/// Query for the tasks a rule may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Project or user task list holding the tasks.
    pub scope: ScopeId,
    /// Sections whose tasks are eligible.
    pub sections: BTreeSet<SectionId>,
    /// Due window the tasks must fall into.
    pub window: ResolvedDueWindow,
}

/// Remote task tracker contract.
///
/// Implementations never return completed tasks from
/// [`TaskTracker::get_tasks`] and filter by
/// [`ResolvedDueWindow::contains`].
#[cfg_attr(test, mockall::automock)]
pub trait TaskTracker {
    /// Looks up the unique identifier of a named resource inside a
    /// container.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Lookup`] when the name is missing or
    /// ambiguous, or a transport error.
    fn resolve_id_by_name(
        &self,
        resource: ResourceType,
        within: &LookupScope,
        name: &str,
    ) -> TrackerResult<String>;

    /// Returns the identifier of a user's task list in a workspace.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Lookup`] when the user has no task list
    /// there, or a transport error.
    fn get_user_task_list_id(
        &self,
        workspace: &WorkspaceId,
        user: &UserRef,
    ) -> TrackerResult<ScopeId>;

    /// Returns the live sections of a scope keyed by id.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`TrackerError::Lookup`] for an unknown
    /// scope.
    fn get_sections(&self, scope: &ScopeId) -> TrackerResult<BTreeMap<SectionId, String>>;

    /// Returns the incomplete tasks matching a query.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`TrackerError::Lookup`] for an unknown
    /// scope.
    fn get_tasks(&self, query: &TaskQuery) -> TrackerResult<Vec<Task>>;

    /// Moves a task into a section at the given position.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`TrackerError::Lookup`] for an unknown
    /// task or section.
    fn move_task_to_section(
        &self,
        task: &TaskId,
        section: &SectionId,
        insert_at: InsertPosition,
    ) -> TrackerResult<()>;
}

/// Errors returned by task tracker implementations.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// A named resource was missing, ambiguous, or did not match its id.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The tracker rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request failed or the tracker answered with an error status.
    #[error("request failed: {0}")]
    Request(Arc<dyn std::error::Error + Send + Sync>),

    /// The tracker answered with a body that could not be understood.
    #[error("invalid response: {0}")]
    Response(Arc<dyn std::error::Error + Send + Sync>),
}

impl TrackerError {
    /// Wraps a transport or status error.
    pub fn request(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Request(Arc::new(err))
    }

    /// Wraps a decoding error.
    pub fn response(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Response(Arc::new(err))
    }
}
