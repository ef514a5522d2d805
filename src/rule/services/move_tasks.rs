//! Move-tasks rule: moves incomplete tasks whose due date falls inside a
//! window from a set of source sections into a destination section.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use super::{
    lifecycle::{
        ExecutionContext, RULE_TYPE_KEY, Rule, RuleConfigError, RuleCore, RuleExecutionError,
        RuleSyncError, TEST_REPORT_ONLY_KEY,
    },
    report::{MoveDecision, RuleReport},
};
use crate::config::{RuleSection, ValueError};
use crate::rule::{
    domain::{
        DueWindow, InsertPosition, LookupError, ResourceType, ScopeId, SectionId,
        SectionSelector, WorkspaceId, build_due_window, find_unique_id_by_name,
        resolve_allowed_sections,
    },
    ports::{LookupScope, TaskQuery, TaskTracker, UserRef},
};

/// Type tags selecting the move-tasks rule.
pub const MOVE_TASKS_RULE_TYPES: [&str; 6] = [
    "move tasks",
    "auto-promote tasks",
    "auto-promote",
    "auto promote tasks",
    "auto promote",
    "promote tasks",
];

const FOR_MY_TASKS_LIST: &str = "for my tasks list";
const USER_TASK_LIST_ID: &str = "user task list id";
const PROJECT_NAME: &str = "project name";
const PROJECT_GID: &str = "project gid";
const WORKSPACE_NAME: &str = "workspace name";
const WORKSPACE_GID: &str = "workspace gid";
const NO_DUE_DATE: &str = "no due date";
const MIN_TIME_UNTIL_DUE: &str = "min time until due";
const MAX_TIME_UNTIL_DUE: &str = "max time until due";
const ASSUMED_MIN_TIME: &str = "assumed time for min due";
const ASSUMED_MAX_TIME: &str = "assumed time for max due";
const INCLUDE_NAMES: &str = "src sections include names";
const INCLUDE_GIDS: &str = "src sections include gids";
const EXCLUDE_NAMES: &str = "src sections exclude names";
const EXCLUDE_GIDS: &str = "src sections exclude gids";
const DST_SECTION_NAME: &str = "dst section name";
const DST_SECTION_GID: &str = "dst section gid";
const DST_INSERT_AT: &str = "dst section insert at";

const KNOWN_KEYS: [&str; 20] = [
    RULE_TYPE_KEY,
    TEST_REPORT_ONLY_KEY,
    FOR_MY_TASKS_LIST,
    USER_TASK_LIST_ID,
    PROJECT_NAME,
    PROJECT_GID,
    WORKSPACE_NAME,
    WORKSPACE_GID,
    NO_DUE_DATE,
    MIN_TIME_UNTIL_DUE,
    MAX_TIME_UNTIL_DUE,
    ASSUMED_MIN_TIME,
    ASSUMED_MAX_TIME,
    INCLUDE_NAMES,
    INCLUDE_GIDS,
    EXCLUDE_NAMES,
    EXCLUDE_GIDS,
    DST_SECTION_NAME,
    DST_SECTION_GID,
    DST_INSERT_AT,
];

/// A remote resource given by name, by id, or both.
///
/// When both are given they must refer to the same resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Designator<Id> {
    /// Exact resource name.
    pub name: Option<String>,
    /// Resource id.
    pub id: Option<Id>,
}

impl<Id> Designator<Id> {
    /// Creates a designator.
    #[must_use]
    pub const fn new(name: Option<String>, id: Option<Id>) -> Self {
        Self { name, id }
    }

    /// Returns `true` when neither name nor id is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.id.is_none()
    }

    fn read(section: &RuleSection, name_key: &str, id_key: &str) -> Self
    where
        Id: From<String>,
    {
        Self {
            name: section.get(name_key).map(ToOwned::to_owned),
            id: section.get(id_key).map(|id| Id::from(id.to_owned())),
        }
    }
}

impl<Id> Default for Designator<Id> {
    fn default() -> Self {
        Self {
            name: None,
            id: None,
        }
    }
}

/// Typed parameters of a move-tasks rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTasksParams {
    /// Act on the authenticated user's own task list.
    pub for_my_tasks_list: bool,
    /// Act on an explicit user task list.
    pub user_task_list_id: Option<ScopeId>,
    /// Act on a project.
    pub project: Designator<ScopeId>,
    /// Workspace holding the project or user task list.
    pub workspace: Designator<WorkspaceId>,
    /// Due window tasks must fall inside.
    pub window: DueWindow,
    /// Source sections to take tasks from.
    pub sources: SectionSelector,
    /// Destination section.
    pub destination: Designator<SectionId>,
    /// Insertion point in the destination section.
    pub insert_at: InsertPosition,
}

impl Default for MoveTasksParams {
    fn default() -> Self {
        Self {
            for_my_tasks_list: false,
            user_task_list_id: None,
            project: Designator::default(),
            workspace: Designator::default(),
            window: DueWindow::open(),
            sources: SectionSelector::new(),
            destination: Designator::default(),
            insert_at: InsertPosition::default(),
        }
    }
}

impl MoveTasksParams {
    /// Parses the rule-specific keys of a section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::Value`] for unparseable values and
    /// [`RuleConfigError::DueWindow`] for an inconsistent due window.
    pub fn from_section(section: &RuleSection) -> Result<Self, RuleConfigError> {
        let window = build_due_window(
            section.get(MIN_TIME_UNTIL_DUE),
            section.get(MAX_TIME_UNTIL_DUE),
            section.get_bool(NO_DUE_DATE)?.unwrap_or(false),
            section.get_clock_time(ASSUMED_MIN_TIME)?,
            section.get_clock_time(ASSUMED_MAX_TIME)?,
        )?;
        let insert_at = section
            .get(DST_INSERT_AT)
            .map(InsertPosition::try_from)
            .transpose()
            .map_err(|err| ValueError::InvalidChoice {
                key: DST_INSERT_AT.to_owned(),
                reason: err.to_string(),
            })?
            .unwrap_or_default();
        let sources = SectionSelector::new()
            .including_names(section.get_name_list(INCLUDE_NAMES))
            .including_ids(section.get_id_list(INCLUDE_GIDS))
            .excluding_names(section.get_name_list(EXCLUDE_NAMES))
            .excluding_ids(section.get_id_list(EXCLUDE_GIDS));

        Ok(Self {
            for_my_tasks_list: section.get_bool(FOR_MY_TASKS_LIST)?.unwrap_or(false),
            user_task_list_id: section.get(USER_TASK_LIST_ID).map(ScopeId::new),
            project: Designator::read(section, PROJECT_NAME, PROJECT_GID),
            workspace: Designator::read(section, WORKSPACE_NAME, WORKSPACE_GID),
            window,
            sources,
            destination: Designator::read(section, DST_SECTION_NAME, DST_SECTION_GID),
            insert_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SyncedTargets {
    scope: ScopeId,
    destination: SectionId,
    destination_name: String,
    allowed: BTreeSet<SectionId>,
}

/// Rule moving matching tasks into a destination section.
#[derive(Debug, Clone)]
pub struct MoveTasksRule {
    core: RuleCore,
    params: MoveTasksParams,
    synced: Option<SyncedTargets>,
}

impl MoveTasksRule {
    /// Creates a rule, rejecting structurally invalid parameters.
    ///
    /// # Errors
    ///
    /// Returns the [`RuleConfigError`] raised by [`Rule::check_structure`].
    pub fn new(core: RuleCore, params: MoveTasksParams) -> Result<Self, RuleConfigError> {
        let rule = Self {
            core,
            params,
            synced: None,
        };
        rule.check_structure()?;
        Ok(rule)
    }

    /// Builds a rule from its configuration section. Unrecognised keys are
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] for missing, malformed or conflicting
    /// keys.
    pub fn from_section(section: &RuleSection) -> Result<Self, RuleConfigError> {
        for key in section.unknown_keys(&KNOWN_KEYS) {
            warn!(rule_id = section.id(), key = %key, "ignoring unrecognised rule key");
        }
        Self::new(
            RuleCore::from_section(section)?,
            MoveTasksParams::from_section(section)?,
        )
    }

    /// Registry constructor for the move-tasks rule types.
    ///
    /// # Errors
    ///
    /// See [`MoveTasksRule::from_section`].
    pub fn boxed_from_section(section: &RuleSection) -> Result<Box<dyn Rule>, RuleConfigError> {
        Ok(Box::new(Self::from_section(section)?))
    }

    /// Returns the parsed parameters.
    #[must_use]
    pub const fn params(&self) -> &MoveTasksParams {
        &self.params
    }

    /// Returns the resolved project or user task list, once synced.
    #[must_use]
    pub fn scope(&self) -> Option<&ScopeId> {
        self.synced.as_ref().map(|synced| &synced.scope)
    }

    /// Returns the resolved destination section, once synced.
    #[must_use]
    pub fn destination(&self) -> Option<&SectionId> {
        self.synced.as_ref().map(|synced| &synced.destination)
    }

    /// Returns the sections tasks may be taken from, once synced.
    #[must_use]
    pub fn allowed_sections(&self) -> Option<&BTreeSet<SectionId>> {
        self.synced.as_ref().map(|synced| &synced.allowed)
    }

    fn resolve_scope(
        &self,
        tracker: &dyn TaskTracker,
        workspace: &WorkspaceId,
    ) -> Result<ScopeId, RuleSyncError> {
        if self.params.for_my_tasks_list {
            return Ok(tracker.get_user_task_list_id(workspace, &UserRef::Me)?);
        }
        if let Some(list_id) = &self.params.user_task_list_id {
            return Ok(list_id.clone());
        }
        resolve_designator(
            tracker,
            ResourceType::Project,
            &LookupScope::Workspace(workspace.clone()),
            &self.params.project,
        )
    }

    fn resolve_destination(
        &self,
        sections: &BTreeMap<SectionId, String>,
    ) -> Result<SectionId, LookupError> {
        let destination = &self.params.destination;
        match (&destination.name, &destination.id) {
            (Some(name), expected) => find_unique_id_by_name(
                ResourceType::Section,
                sections.iter().map(|(id, n)| (id, n.as_str())),
                name,
                expected.as_ref(),
            ),
            (None, Some(id)) if sections.contains_key(id) => Ok(id.clone()),
            (None, id) => Err(LookupError::DataNotFound {
                resource: ResourceType::Section,
                name: id.as_ref().map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }
}

fn resolve_designator<Id>(
    tracker: &dyn TaskTracker,
    resource: ResourceType,
    within: &LookupScope,
    designator: &Designator<Id>,
) -> Result<Id, RuleSyncError>
where
    Id: Clone + From<String> + AsRef<str>,
{
    match (&designator.name, &designator.id) {
        (Some(name), expected) => {
            let found = tracker.resolve_id_by_name(resource, within, name)?;
            if let Some(expected_id) = expected
                && expected_id.as_ref() != found
            {
                return Err(LookupError::MismatchedData {
                    resource,
                    name: name.clone(),
                    found,
                    expected: expected_id.as_ref().to_owned(),
                }
                .into());
            }
            Ok(Id::from(found))
        }
        (None, Some(id)) => Ok(id.clone()),
        (None, None) => Err(LookupError::DataNotFound {
            resource,
            name: String::new(),
        }
        .into()),
    }
}

impl Rule for MoveTasksRule {
    fn core(&self) -> &RuleCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut RuleCore {
        &mut self.core
    }

    fn check_structure(&self) -> Result<(), RuleConfigError> {
        let params = &self.params;
        if params.for_my_tasks_list && params.user_task_list_id.is_some() {
            return Err(RuleConfigError::ExclusiveKeys {
                first: FOR_MY_TASKS_LIST,
                second: USER_TASK_LIST_ID,
            });
        }
        let uses_user_task_list = params.for_my_tasks_list || params.user_task_list_id.is_some();
        match (uses_user_task_list, params.project.is_empty()) {
            (true, false) => {
                return Err(RuleConfigError::ExclusiveKeys {
                    first: if params.for_my_tasks_list {
                        FOR_MY_TASKS_LIST
                    } else {
                        USER_TASK_LIST_ID
                    },
                    second: if params.project.name.is_some() {
                        PROJECT_NAME
                    } else {
                        PROJECT_GID
                    },
                });
            }
            (false, true) => {
                return Err(RuleConfigError::MissingKey(format!(
                    "one of '{FOR_MY_TASKS_LIST}', '{USER_TASK_LIST_ID}', '{PROJECT_NAME}' or '{PROJECT_GID}'"
                )));
            }
            _ => {}
        }
        if params.workspace.is_empty() {
            return Err(RuleConfigError::MissingKey(format!(
                "'{WORKSPACE_NAME}' or '{WORKSPACE_GID}'"
            )));
        }
        if params.destination.is_empty() {
            return Err(RuleConfigError::MissingKey(format!(
                "'{DST_SECTION_NAME}' or '{DST_SECTION_GID}'"
            )));
        }
        Ok(())
    }

    fn sync_with_api(&mut self, tracker: &dyn TaskTracker) -> Result<(), RuleSyncError> {
        self.synced = None;
        let workspace: WorkspaceId = resolve_designator(
            tracker,
            ResourceType::Workspace,
            &LookupScope::Global,
            &self.params.workspace,
        )?;
        let scope = self.resolve_scope(tracker, &workspace)?;
        let sections = tracker.get_sections(&scope)?;
        let destination = self.resolve_destination(&sections)?;
        let allowed = resolve_allowed_sections(&self.params.sources, &sections)?;

        debug!(
            rule_id = self.core.id(),
            workspace_id = %workspace,
            scope_id = %scope,
            section_id = %destination,
            allowed = allowed.len(),
            "resolved move targets"
        );
        self.synced = Some(SyncedTargets {
            scope,
            destination_name: sections.get(&destination).cloned().unwrap_or_default(),
            destination,
            allowed,
        });
        Ok(())
    }

    fn execute(&mut self, ctx: &ExecutionContext<'_>) -> Result<RuleReport, RuleExecutionError> {
        let synced = self.synced.as_ref().ok_or(RuleExecutionError::NotSynced)?;
        let report_only = self.core.test_report_only() || ctx.force_test_report_only;
        let query = TaskQuery {
            scope: synced.scope.clone(),
            sections: synced.allowed.clone(),
            window: self.params.window.resolve(ctx.now)?,
        };
        let tasks = ctx.tracker.get_tasks(&query)?;

        let mut report = RuleReport::new(self.core.id(), report_only);
        for task in tasks {
            if report_only {
                info!(
                    rule_id = self.core.id(),
                    task_id = %task.id(),
                    section_id = %synced.destination,
                    "would move task (report only)"
                );
            } else {
                if let Err(source) = ctx.tracker.move_task_to_section(
                    task.id(),
                    &synced.destination,
                    self.params.insert_at,
                ) {
                    return Err(RuleExecutionError::MoveFailed {
                        source,
                        partial: Box::new(report),
                    });
                }
                info!(
                    rule_id = self.core.id(),
                    task_id = %task.id(),
                    section_id = %synced.destination,
                    "moved task"
                );
            }
            report.decisions.push(MoveDecision {
                task_id: task.id().clone(),
                task_name: task.name().to_owned(),
                destination: synced.destination.clone(),
                destination_name: synced.destination_name.clone(),
                applied: !report_only,
            });
        }
        Ok(report)
    }

    fn is_criteria_met(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }
        let has_sources = self
            .synced
            .as_ref()
            .is_some_and(|synced| !synced.allowed.is_empty());
        if !has_sources {
            debug!(rule_id = self.core.id(), "no source sections to take tasks from");
        }
        has_sources
    }
}
