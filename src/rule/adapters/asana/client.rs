//! Blocking HTTP client implementing [`TaskTracker`] against Asana.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::models::{Envelope, GidRecord, NamedRecord, Page, SectionRecord, TaskRecord};
use crate::rule::{
    domain::{
        InsertPosition, LookupError, ResourceType, ScopeId, SectionId, Task, TaskId, WorkspaceId,
        find_unique_id_by_name,
    },
    ports::{LookupScope, TaskQuery, TaskTracker, TrackerError, TrackerResult, UserRef},
};

/// Base URL of the public Asana API.
pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

const PAGE_LIMIT: &str = "100";
const TASK_FIELDS: &str = "name,completed,due_on,due_at,memberships.section.gid";

/// Non-success HTTP status returned by the API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("HTTP {status}: {body}")]
pub struct StatusError {
    /// Numeric HTTP status.
    pub status: u16,
    /// Response body, as returned.
    pub body: String,
}

/// Task tracker talking to the Asana REST API with a personal access token.
pub struct AsanaTaskTracker {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for AsanaTaskTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsanaTaskTracker")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AsanaTaskTracker {
    /// Creates a client for the public API.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Request`] when the HTTP client cannot be
    /// built.
    pub fn new(token: impl Into<String>) -> TrackerResult<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Creates a client for an alternative API root, such as a test server.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Request`] when the HTTP client cannot be
    /// built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> TrackerResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Asana-Enable",
            HeaderValue::from_static("new_user_task_lists"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(TrackerError::request)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> TrackerResult<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(TrackerError::request)?;
        let status = response.status();
        let body = response.text().map_err(TrackerError::request)?;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TrackerError::Authentication(body));
        }
        if !status.is_success() {
            return Err(TrackerError::request(StatusError {
                status: status.as_u16(),
                body,
            }));
        }
        serde_json::from_str(&body).map_err(TrackerError::response)
    }

    fn get_one<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> TrackerResult<T> {
        let envelope: Envelope<T> = self.send(self.client.get(self.url(path)).query(query))?;
        Ok(envelope.data)
    }

    fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> TrackerResult<Vec<T>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.url(path))
                .query(query)
                .query(&[("limit", PAGE_LIMIT)]);
            if let Some(token) = &offset {
                request = request.query(&[("offset", token.as_str())]);
            }
            let page: Page<T> = self.send(request)?;
            records.extend(page.data);
            let Some(next) = page.next_page else {
                return Ok(records);
            };
            offset = Some(next.offset);
        }
    }

    fn post(&self, path: &str, data: serde_json::Value) -> TrackerResult<()> {
        let _: serde_json::Value = self.send(
            self.client
                .post(self.url(path))
                .json(&json!({ "data": data })),
        )?;
        Ok(())
    }
}

impl TaskTracker for AsanaTaskTracker {
    fn resolve_id_by_name(
        &self,
        resource: ResourceType,
        within: &LookupScope,
        name: &str,
    ) -> TrackerResult<String> {
        let records: Vec<NamedRecord> = match (resource, within) {
            (ResourceType::Workspace, LookupScope::Global) => {
                self.get_all("workspaces", &[("opt_fields", "name")])?
            }
            (ResourceType::Project, LookupScope::Workspace(workspace)) => self.get_all(
                "projects",
                &[
                    ("workspace", workspace.as_str()),
                    ("archived", "false"),
                    ("opt_fields", "name"),
                ],
            )?,
            (ResourceType::Section, LookupScope::Scope(scope)) => {
                self.get_all(&format!("projects/{scope}/sections"), &[("opt_fields", "name")])?
            }
            _ => {
                return Err(LookupError::DataNotFound {
                    resource,
                    name: name.to_owned(),
                }
                .into());
            }
        };
        find_unique_id_by_name(
            resource,
            records
                .iter()
                .map(|record| (&record.gid, record.name.as_deref().unwrap_or_default())),
            name,
            None,
        )
        .map_err(TrackerError::from)
    }

    fn get_user_task_list_id(
        &self,
        workspace: &WorkspaceId,
        user: &UserRef,
    ) -> TrackerResult<ScopeId> {
        let record: GidRecord = self.get_one(
            &format!("users/{}/user_task_list", user.as_api_str()),
            &[("workspace", workspace.as_str())],
        )?;
        Ok(ScopeId::new(record.gid))
    }

    fn get_sections(&self, scope: &ScopeId) -> TrackerResult<BTreeMap<SectionId, String>> {
        let records: Vec<NamedRecord> =
            self.get_all(&format!("projects/{scope}/sections"), &[("opt_fields", "name")])?;
        Ok(records
            .into_iter()
            .map(|record| (SectionId::new(record.gid), record.name.unwrap_or_default()))
            .collect())
    }

    fn get_tasks(&self, query: &TaskQuery) -> TrackerResult<Vec<Task>> {
        let mut seen: BTreeSet<TaskId> = BTreeSet::new();
        let mut tasks = Vec::new();
        for section in &query.sections {
            let records: Vec<TaskRecord> = self.get_all(
                &format!("sections/{section}/tasks"),
                &[("completed_since", "now"), ("opt_fields", TASK_FIELDS)],
            )?;
            debug!(section_id = %section, count = records.len(), "fetched section tasks");
            for task in records.into_iter().map(TaskRecord::into_task) {
                if task.is_completed() || !query.window.contains(&task) {
                    continue;
                }
                if seen.insert(task.id().clone()) {
                    tasks.push(task);
                }
            }
        }
        Ok(tasks)
    }

    fn move_task_to_section(
        &self,
        task: &TaskId,
        section: &SectionId,
        insert_at: InsertPosition,
    ) -> TrackerResult<()> {
        match insert_at {
            InsertPosition::Top => self.post(
                &format!("sections/{section}/addTask"),
                json!({ "task": task.as_str() }),
            ),
            InsertPosition::Bottom => {
                let record: SectionRecord =
                    self.get_one(&format!("sections/{section}"), &[("opt_fields", "project")])?;
                let project = record.project.ok_or_else(|| LookupError::DataNotFound {
                    resource: ResourceType::Project,
                    name: section.to_string(),
                })?;
                self.post(
                    &format!("tasks/{task}/addProject"),
                    json!({ "project": project.gid, "section": section.as_str() }),
                )
            }
        }
    }
}
