//! In-memory task tracker for tests and dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::rule::{
    domain::{
        InsertPosition, LookupError, ResourceType, ScopeId, SectionId, Task, TaskId,
        WorkspaceId, find_unique_id_by_name,
    },
    ports::{LookupScope, TaskQuery, TaskTracker, TrackerError, TrackerResult, UserRef},
};

/// A move directive received by [`InMemoryTaskTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    /// Task that was moved.
    pub task: TaskId,
    /// Destination section.
    pub section: SectionId,
    /// Requested insertion point.
    pub insert_at: InsertPosition,
}

/// Thread-safe in-memory task tracker seeded through builder methods.
#[derive(Debug, Default)]
pub struct InMemoryTaskTracker {
    state: RwLock<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    workspaces: BTreeMap<WorkspaceId, String>,
    projects: BTreeMap<ScopeId, (WorkspaceId, String)>,
    user_task_lists: BTreeMap<(WorkspaceId, String), ScopeId>,
    sections: BTreeMap<ScopeId, BTreeMap<SectionId, String>>,
    tasks: BTreeMap<ScopeId, Vec<Task>>,
    failing_scopes: BTreeMap<ScopeId, String>,
    moves: Vec<RecordedMove>,
}

impl TrackerState {
    fn check_scope(&self, scope: &ScopeId) -> TrackerResult<()> {
        if let Some(message) = self.failing_scopes.get(scope) {
            return Err(TrackerError::request(std::io::Error::other(message.clone())));
        }
        let known = self.projects.contains_key(scope)
            || self.user_task_lists.values().any(|id| id == scope)
            || self.sections.contains_key(scope);
        if known {
            Ok(())
        } else {
            Err(LookupError::DataNotFound {
                resource: ResourceType::Project,
                name: scope.to_string(),
            }
            .into())
        }
    }

    fn scope_of_section(&self, section: &SectionId) -> Option<&ScopeId> {
        self.sections
            .iter()
            .find(|(_, sections)| sections.contains_key(section))
            .map(|(scope, _)| scope)
    }
}

impl InMemoryTaskTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn seed(&mut self) -> &mut TrackerState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a workspace.
    #[must_use]
    pub fn with_workspace(mut self, id: impl Into<WorkspaceId>, name: impl Into<String>) -> Self {
        self.seed().workspaces.insert(id.into(), name.into());
        self
    }

    /// Adds a project to a workspace.
    #[must_use]
    pub fn with_project(
        mut self,
        workspace: impl Into<WorkspaceId>,
        id: impl Into<ScopeId>,
        name: impl Into<String>,
    ) -> Self {
        self.seed()
            .projects
            .insert(id.into(), (workspace.into(), name.into()));
        self
    }

    /// Adds a user task list. Use [`UserRef::Me`] for the list of the
    /// authenticated user.
    #[must_use]
    pub fn with_user_task_list(
        mut self,
        workspace: impl Into<WorkspaceId>,
        user: &UserRef,
        id: impl Into<ScopeId>,
    ) -> Self {
        self.seed()
            .user_task_lists
            .insert((workspace.into(), user.as_api_str().to_owned()), id.into());
        self
    }

    /// Adds a section to a project or user task list.
    #[must_use]
    pub fn with_section(
        mut self,
        scope: impl Into<ScopeId>,
        id: impl Into<SectionId>,
        name: impl Into<String>,
    ) -> Self {
        self.seed()
            .sections
            .entry(scope.into())
            .or_default()
            .insert(id.into(), name.into());
        self
    }

    /// Adds a task to a project or user task list.
    #[must_use]
    pub fn with_task(mut self, scope: impl Into<ScopeId>, task: Task) -> Self {
        self.seed().tasks.entry(scope.into()).or_default().push(task);
        self
    }

    /// Makes every call touching `scope` fail with a request error.
    #[must_use]
    pub fn with_failing_scope(
        mut self,
        scope: impl Into<ScopeId>,
        message: impl Into<String>,
    ) -> Self {
        self.seed()
            .failing_scopes
            .insert(scope.into(), message.into());
        self
    }

    /// Returns the move directives received so far, in order.
    #[must_use]
    pub fn moves(&self) -> Vec<RecordedMove> {
        self.read_state()
            .map(|state| state.moves.clone())
            .unwrap_or_default()
    }

    /// Returns the ids of tasks currently in a section.
    #[must_use]
    pub fn tasks_in_section(&self, section: &SectionId) -> Vec<TaskId> {
        self.read_state()
            .map(|state| {
                state
                    .tasks
                    .values()
                    .flatten()
                    .filter(|task| task.is_in_section(section))
                    .map(|task| task.id().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_state(&self) -> TrackerResult<RwLockReadGuard<'_, TrackerState>> {
        self.state
            .read()
            .map_err(|err| TrackerError::request(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> TrackerResult<RwLockWriteGuard<'_, TrackerState>> {
        self.state
            .write()
            .map_err(|err| TrackerError::request(std::io::Error::other(err.to_string())))
    }
}

impl TaskTracker for InMemoryTaskTracker {
    fn resolve_id_by_name(
        &self,
        resource: ResourceType,
        within: &LookupScope,
        name: &str,
    ) -> TrackerResult<String> {
        let state = self.read_state()?;
        let parent = within.parent_id();
        let found = match resource {
            ResourceType::Workspace => find_unique_id_by_name(
                resource,
                state.workspaces.iter().map(|(id, n)| (id, n.as_str())),
                name,
                None,
            )?
            .to_string(),
            ResourceType::Project => find_unique_id_by_name(
                resource,
                state
                    .projects
                    .iter()
                    .filter(|(_, (workspace, _))| {
                        parent.is_none_or(|wanted| workspace.as_str() == wanted)
                    })
                    .map(|(id, (_, n))| (id, n.as_str())),
                name,
                None,
            )?
            .to_string(),
            ResourceType::Section => find_unique_id_by_name(
                resource,
                state
                    .sections
                    .iter()
                    .filter(|(scope, _)| parent.is_none_or(|wanted| scope.as_str() == wanted))
                    .flat_map(|(_, sections)| sections.iter().map(|(id, n)| (id, n.as_str()))),
                name,
                None,
            )?
            .to_string(),
            ResourceType::UserTaskList | ResourceType::Task => {
                return Err(LookupError::DataNotFound {
                    resource,
                    name: name.to_owned(),
                }
                .into());
            }
        };
        Ok(found)
    }

    fn get_user_task_list_id(
        &self,
        workspace: &WorkspaceId,
        user: &UserRef,
    ) -> TrackerResult<ScopeId> {
        let state = self.read_state()?;
        state
            .user_task_lists
            .get(&(workspace.clone(), user.as_api_str().to_owned()))
            .cloned()
            .ok_or_else(|| {
                LookupError::DataNotFound {
                    resource: ResourceType::UserTaskList,
                    name: user.as_api_str().to_owned(),
                }
                .into()
            })
    }

    fn get_sections(&self, scope: &ScopeId) -> TrackerResult<BTreeMap<SectionId, String>> {
        let state = self.read_state()?;
        state.check_scope(scope)?;
        Ok(state.sections.get(scope).cloned().unwrap_or_default())
    }

    fn get_tasks(&self, query: &TaskQuery) -> TrackerResult<Vec<Task>> {
        let state = self.read_state()?;
        state.check_scope(&query.scope)?;
        let tasks = state
            .tasks
            .get(&query.scope)
            .into_iter()
            .flatten()
            .filter(|task| !task.is_completed())
            .filter(|task| {
                task.section_ids()
                    .iter()
                    .any(|section| query.sections.contains(section))
            })
            .filter(|task| query.window.contains(task))
            .cloned()
            .collect();
        Ok(tasks)
    }

    fn move_task_to_section(
        &self,
        task: &TaskId,
        section: &SectionId,
        insert_at: InsertPosition,
    ) -> TrackerResult<()> {
        let mut state = self.write_state()?;
        let scope = state
            .scope_of_section(section)
            .cloned()
            .ok_or_else(|| LookupError::DataNotFound {
                resource: ResourceType::Section,
                name: section.to_string(),
            })?;
        state.check_scope(&scope)?;

        let siblings: BTreeSet<SectionId> = state
            .sections
            .get(&scope)
            .map(|sections| sections.keys().cloned().collect())
            .unwrap_or_default();
        let stored = state
            .tasks
            .values_mut()
            .flatten()
            .find(|candidate| candidate.id() == task)
            .ok_or_else(|| LookupError::DataNotFound {
                resource: ResourceType::Task,
                name: task.to_string(),
            })?;
        stored.relocate(&siblings, section.clone());

        state.moves.push(RecordedMove {
            task: task.clone(),
            section: section.clone(),
            insert_at,
        });
        Ok(())
    }
}
