//! Per-rule reports and the aggregate run summary.

use chrono::{DateTime, FixedOffset};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::rule::domain::{SectionId, TaskId};

const SUMMARY_TEMPLATE: &str = "\
Run {{ run_id }} {{ outcome }}.
{% for record in records %}- {{ record.rule_id }}: {{ record.label }}{% if record.detail %}: {{ record.detail }}{% endif %}
{% for decision in record.decisions %}  {{ decision.verb }} task {{ decision.task_id }} ({{ decision.task_name }}) to {{ decision.destination_name }} [{{ decision.destination }}]
{% endfor %}{% endfor %}";

/// One task a rule moved, or would have moved in report-only mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDecision {
    /// Task that matched the rule.
    pub task_id: TaskId,
    /// Task name at the time of the run.
    pub task_name: String,
    /// Destination section.
    pub destination: SectionId,
    /// Destination section name.
    pub destination_name: String,
    /// Whether the move directive was sent.
    pub applied: bool,
}

/// What a rule decided during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    /// Rule identifier.
    pub rule_id: String,
    /// Whether the rule ran in report-only mode.
    pub test_report_only: bool,
    /// One entry per matching task.
    pub decisions: Vec<MoveDecision>,
}

impl RuleReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, test_report_only: bool) -> Self {
        Self {
            rule_id: rule_id.into(),
            test_report_only,
            decisions: Vec::new(),
        }
    }

    /// Returns the ids of every matched task, in decision order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<&TaskId> {
        self.decisions.iter().map(|decision| &decision.task_id).collect()
    }
}

/// Outcome of one configured rule within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RuleRunStatus {
    /// The rule executed; the report lists its decisions.
    Executed(RuleReport),
    /// The rule was valid but its criteria were not met.
    CriteriaNotMet,
    /// The rule failed structural validation.
    Invalid(String),
    /// The rule failed to sync with the tracker.
    SyncFailed(String),
    /// The rule failed while executing.
    ExecutionFailed {
        /// Why execution stopped.
        cause: String,
        /// Moves already applied when execution stopped.
        partial: Option<RuleReport>,
    },
    /// The rule section could not be turned into a rule.
    LoadFailed(String),
}

impl RuleRunStatus {
    /// Returns `true` for the failing outcomes.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Invalid(_)
                | Self::SyncFailed(_)
                | Self::ExecutionFailed { .. }
                | Self::LoadFailed(_)
        )
    }

    /// Returns a short human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Executed(_) => "executed",
            Self::CriteriaNotMet => "criteria not met",
            Self::Invalid(_) => "invalid",
            Self::SyncFailed(_) => "sync failed",
            Self::ExecutionFailed { .. } => "execution failed",
            Self::LoadFailed(_) => "load failed",
        }
    }

    /// Returns the decisions carried by the outcome: every decision of an
    /// executed rule, or those applied before an execution failure.
    #[must_use]
    pub const fn report(&self) -> Option<&RuleReport> {
        match self {
            Self::Executed(report)
            | Self::ExecutionFailed {
                partial: Some(report),
                ..
            } => Some(report),
            _ => None,
        }
    }

    /// Returns the failure cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Invalid(cause)
            | Self::SyncFailed(cause)
            | Self::ExecutionFailed { cause, .. }
            | Self::LoadFailed(cause) => Some(cause),
            Self::Executed(_) | Self::CriteriaNotMet => None,
        }
    }
}

/// Outcome of one configured rule, keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRunRecord {
    /// Rule identifier.
    pub rule_id: String,
    /// What happened to the rule.
    #[serde(flatten)]
    pub status: RuleRunStatus,
}

/// Errors raised while rendering a run summary.
#[derive(Debug, Clone, Error)]
pub enum SummaryRenderError {
    /// JSON serialisation failed.
    #[error("failed to serialise run summary: {0}")]
    Json(Arc<serde_json::Error>),
    /// Text rendering failed.
    #[error("failed to render run summary: {0}")]
    Template(String),
}

/// Aggregate outcome of a run over every configured rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    run_id: Uuid,
    started_at: DateTime<FixedOffset>,
    records: Vec<RuleRunRecord>,
}

impl RunSummary {
    /// Creates an empty summary for a run started at `started_at`.
    #[must_use]
    pub fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            records: Vec::new(),
        }
    }

    /// Appends the outcome of one rule.
    pub fn record(&mut self, rule_id: impl Into<String>, status: RuleRunStatus) {
        self.records.push(RuleRunRecord {
            rule_id: rule_id.into(),
            status,
        });
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the reference instant of the run.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<FixedOffset> {
        self.started_at
    }

    /// Returns every record in run order.
    #[must_use]
    pub fn records(&self) -> &[RuleRunRecord] {
        &self.records
    }

    /// Returns the record for a rule id.
    #[must_use]
    pub fn find(&self, rule_id: &str) -> Option<&RuleRunRecord> {
        self.records.iter().find(|record| record.rule_id == rule_id)
    }

    /// Returns the failed records.
    pub fn failed(&self) -> impl Iterator<Item = &RuleRunRecord> {
        self.records.iter().filter(|record| record.status.is_failure())
    }

    /// Returns `true` when no rule failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Returns the one-line outcome of the run.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        if self.records.is_empty() {
            "had no rules to run"
        } else if self.is_success() {
            "completed successfully"
        } else {
            "completed, but with errors"
        }
    }

    /// Serialises the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryRenderError::Json`] when serialisation fails.
    pub fn to_json(&self) -> Result<String, SummaryRenderError> {
        serde_json::to_string_pretty(self).map_err(|err| SummaryRenderError::Json(Arc::new(err)))
    }

    /// Renders the summary as plain text, one line per rule and one
    /// indented line per task decision.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryRenderError::Template`] when rendering fails.
    pub fn render_text(&self) -> Result<String, SummaryRenderError> {
        Environment::new()
            .render_str(SUMMARY_TEMPLATE, self.template_context())
            .map_err(|err| SummaryRenderError::Template(err.to_string()))
    }

    fn template_context(&self) -> Value {
        let records: Vec<Value> = self
            .records
            .iter()
            .map(|record| {
                let decisions: Vec<Value> = record
                    .status
                    .report()
                    .into_iter()
                    .flat_map(|report| &report.decisions)
                    .map(|decision| {
                        json!({
                            "verb": if decision.applied { "moved" } else { "would move" },
                            "task_id": decision.task_id.as_str(),
                            "task_name": decision.task_name,
                            "destination": decision.destination.as_str(),
                            "destination_name": decision.destination_name,
                        })
                    })
                    .collect();
                json!({
                    "rule_id": record.rule_id,
                    "label": record.status.label(),
                    "detail": record.status.cause(),
                    "decisions": decisions,
                })
            })
            .collect();
        json!({
            "run_id": self.run_id.to_string(),
            "outcome": self.outcome(),
            "records": records,
        })
    }
}
