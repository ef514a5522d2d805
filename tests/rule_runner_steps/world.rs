//! Shared world state for rule runner BDD scenarios.

use std::collections::BTreeMap;

use rstest::fixture;
use tasksweep::rule::{
    adapters::InMemoryTaskTracker,
    domain::{ScopeId, SectionId},
    services::RunSummary,
};

/// Section names every scenario project starts with.
pub const PROJECT_SECTIONS: [&str; 3] = ["Inbox", "Today", "Later"];

/// Workspace id used for every scenario workspace.
pub const WORKSPACE_ID: &str = "w1";

/// Scenario world for rule runner behaviour tests.
#[derive(Debug, Default)]
pub struct RunnerWorld {
    /// Tracker seeded by the given steps.
    pub tracker: InMemoryTaskTracker,
    /// Project most recently added, which new tasks are placed in.
    pub current_project: Option<ScopeId>,
    /// Section ids keyed by project and section name.
    pub sections: BTreeMap<(ScopeId, String), SectionId>,
    /// Rules file text assembled by the given steps.
    pub rules_toml: String,
    /// Summary of the last run.
    pub summary: Option<RunSummary>,
}

impl RunnerWorld {
    /// Applies a builder step to the seeded tracker.
    pub fn seed(&mut self, step: impl FnOnce(InMemoryTaskTracker) -> InMemoryTaskTracker) {
        self.tracker = step(std::mem::take(&mut self.tracker));
    }

    /// Looks up a section of the current project by name.
    pub fn section_named(&self, name: &str) -> Result<SectionId, eyre::Report> {
        let project = self
            .current_project
            .clone()
            .ok_or_else(|| eyre::eyre!("no project in scenario world"))?;
        self.sections
            .get(&(project, name.to_owned()))
            .cloned()
            .ok_or_else(|| eyre::eyre!("unknown section '{name}'"))
    }

    /// Returns the summary of the last run.
    pub fn summary(&self) -> Result<&RunSummary, eyre::Report> {
        self.summary
            .as_ref()
            .ok_or_else(|| eyre::eyre!("rules have not run in scenario world"))
    }
}

/// Derives a stable id from a display name.
pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RunnerWorld {
    RunnerWorld::default()
}
