//! Shared rule lifecycle: load, validate, sync with the tracker, check
//! criteria, then execute or report.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use tracing::{debug, warn};

use super::report::RuleReport;
use crate::config::{RuleSection, SectionError, ValueError};
use crate::rule::{
    domain::{DueWindowError, LookupError, SectionResolutionError, TimeframeError},
    ports::{TaskTracker, TrackerError},
};

/// Configuration key selecting the rule variant.
pub const RULE_TYPE_KEY: &str = "rule type";
/// Configuration key forcing a rule into report-only mode.
pub const TEST_REPORT_ONLY_KEY: &str = "test report only";

/// Cached outcome of the last validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validity {
    /// No validation has run yet.
    #[default]
    Unknown,
    /// The last validation pass succeeded.
    Valid,
    /// The last validation pass failed.
    Invalid,
}

/// State shared by every rule variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCore {
    id: String,
    rule_type: String,
    test_report_only: bool,
    validity: Validity,
    failure: Option<String>,
}

impl RuleCore {
    /// Creates a core in the [`Validity::Unknown`] state.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        rule_type: impl Into<String>,
        test_report_only: bool,
    ) -> Self {
        Self {
            id: id.into(),
            rule_type: rule_type.into(),
            test_report_only,
            validity: Validity::Unknown,
            failure: None,
        }
    }

    /// Reads the shared keys of a rule section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::MissingRuleType`] when the section has no
    /// rule type and [`RuleConfigError::Value`] when `test report only` is
    /// not a boolean.
    pub fn from_section(section: &RuleSection) -> Result<Self, RuleConfigError> {
        let rule_type = section
            .get(RULE_TYPE_KEY)
            .ok_or(RuleConfigError::MissingRuleType)?;
        let test_report_only = section.get_bool(TEST_REPORT_ONLY_KEY)?.unwrap_or(false);
        Ok(Self::new(section.id(), rule_type, test_report_only))
    }

    /// Returns the rule identifier (the configuration section name).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the configured rule type tag.
    #[must_use]
    pub fn rule_type(&self) -> &str {
        &self.rule_type
    }

    /// Returns whether the rule only reports what it would do.
    #[must_use]
    pub const fn test_report_only(&self) -> bool {
        self.test_report_only
    }

    /// Returns the cached validity.
    #[must_use]
    pub const fn validity(&self) -> Validity {
        self.validity
    }

    /// Returns the cause of the last failed validation or sync.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Marks the rule valid and clears any recorded failure.
    pub fn mark_valid(&mut self) {
        self.validity = Validity::Valid;
        self.failure = None;
    }

    /// Marks the rule invalid, recording the cause.
    pub fn mark_invalid(&mut self, cause: impl Into<String>) {
        self.validity = Validity::Invalid;
        self.failure = Some(cause.into());
    }
}

/// Inputs available to a rule while executing.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Tracker receiving reads and move directives.
    pub tracker: &'a dyn TaskTracker,
    /// Reference instant shared by every rule in the run.
    pub now: DateTime<FixedOffset>,
    /// Forces report-only mode regardless of the rule's own flag.
    pub force_test_report_only: bool,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context for a run.
    #[must_use]
    pub fn new(
        tracker: &'a dyn TaskTracker,
        now: DateTime<FixedOffset>,
        force_test_report_only: bool,
    ) -> Self {
        Self {
            tracker,
            now,
            force_test_report_only,
        }
    }
}

/// Errors raised while building a rule from its configuration section.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleConfigError {
    /// The section has no `rule type` key.
    #[error("missing required key 'rule type'")]
    MissingRuleType,

    /// No rule variant is registered for the type tag.
    #[error("unknown rule type '{0}'")]
    UnknownRuleType(String),

    /// A required key, or one of a set of alternative keys, is absent.
    #[error("missing required key: {0}")]
    MissingKey(String),

    /// Two mutually exclusive keys are both set.
    #[error("keys '{first}' and '{second}' cannot be combined")]
    ExclusiveKeys {
        /// First configured key.
        first: &'static str,
        /// Second configured key.
        second: &'static str,
    },

    /// A value could not be parsed.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The due window configuration is inconsistent.
    #[error(transparent)]
    DueWindow(#[from] DueWindowError),

    /// The rules file entry is not a usable section.
    #[error(transparent)]
    Section(#[from] SectionError),
}

/// Errors raised while synchronizing a rule with the tracker.
#[derive(Debug, Clone, Error)]
pub enum RuleSyncError {
    /// The tracker call failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// A name did not resolve to exactly one matching id.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The source sections could not be resolved.
    #[error(transparent)]
    Sections(#[from] SectionResolutionError),
}

/// Errors raised while executing a rule.
#[derive(Debug, Clone, Error)]
pub enum RuleExecutionError {
    /// Execution was requested before a successful sync.
    #[error("rule has not been synchronized with the tracker")]
    NotSynced,

    /// The due window could not be resolved against the reference instant.
    #[error(transparent)]
    Timeframe(#[from] TimeframeError),

    /// The tracker call failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// A move directive failed after `partial` had already been applied.
    #[error("{source}")]
    MoveFailed {
        /// The tracker failure that stopped the rule.
        source: TrackerError,
        /// Decisions made before the failure.
        partial: Box<RuleReport>,
    },
}

impl RuleExecutionError {
    /// Returns the decisions that took effect before the failure, if any
    /// were made.
    #[must_use]
    pub fn into_partial_report(self) -> Option<RuleReport> {
        match self {
            Self::MoveFailed { partial, .. } => Some(*partial),
            Self::NotSynced | Self::Timeframe(_) | Self::Tracker(_) => None,
        }
    }
}

/// Lifecycle contract shared by all rule variants.
///
/// Variants implement the structural check, the remote sync and the action;
/// validity caching and error capture are provided.
pub trait Rule {
    /// Returns the shared state.
    fn core(&self) -> &RuleCore;

    /// Returns the shared state mutably.
    fn core_mut(&mut self) -> &mut RuleCore;

    /// Checks the configured parameters without contacting the tracker.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] describing the first structural
    /// problem.
    fn check_structure(&self) -> Result<(), RuleConfigError>;

    /// Resolves names and live state through the tracker.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleSyncError`] for lookup, conflict or transport
    /// failures.
    fn sync_with_api(&mut self, tracker: &dyn TaskTracker) -> Result<(), RuleSyncError>;

    /// Performs the action, or only reports it in report-only mode.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleExecutionError`] when the rule is not synced or a
    /// tracker call fails.
    fn execute(&mut self, ctx: &ExecutionContext<'_>) -> Result<RuleReport, RuleExecutionError>;

    /// Returns the rule identifier.
    fn id(&self) -> &str {
        self.core().id()
    }

    /// Returns the configured type tag.
    fn rule_type(&self) -> &str {
        self.core().rule_type()
    }

    /// Returns whether the rule is configured as report-only.
    fn test_report_only(&self) -> bool {
        self.core().test_report_only()
    }

    /// Returns the cached validity, validating once if nothing is cached.
    fn is_valid(&mut self) -> bool {
        match self.core().validity() {
            Validity::Unknown => self.revalidate(),
            Validity::Valid => true,
            Validity::Invalid => false,
        }
    }

    /// Re-runs the structural check and replaces the cached validity.
    fn revalidate(&mut self) -> bool {
        match self.check_structure() {
            Ok(()) => {
                self.core_mut().mark_valid();
                true
            }
            Err(err) => {
                warn!(rule_id = self.id(), error = %err, "rule failed validation");
                self.core_mut().mark_invalid(err.to_string());
                false
            }
        }
    }

    /// Syncs with the tracker, capturing any failure as invalidity.
    ///
    /// Returns `true` when the rule is valid and the sync succeeded.
    fn sync_and_validate_with_api(&mut self, tracker: &dyn TaskTracker) -> bool {
        if !self.is_valid() {
            return false;
        }
        match self.sync_with_api(tracker) {
            Ok(()) => {
                debug!(rule_id = self.id(), "rule synced with tracker");
                self.core_mut().mark_valid();
                true
            }
            Err(err) => {
                warn!(rule_id = self.id(), error = %err, "rule failed to sync with tracker");
                self.core_mut().mark_invalid(err.to_string());
                false
            }
        }
    }

    /// Returns whether the rule should execute. Defaults to validity.
    fn is_criteria_met(&mut self) -> bool {
        self.is_valid()
    }
}
