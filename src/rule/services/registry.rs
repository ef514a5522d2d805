//! Rule registry and runner.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use mockable::Clock;
use tracing::{error, info, info_span, warn};

use super::{
    lifecycle::{ExecutionContext, RULE_TYPE_KEY, Rule, RuleConfigError},
    move_tasks::{MOVE_TASKS_RULE_TYPES, MoveTasksRule},
    report::{RuleRunStatus, RunSummary},
};
use crate::config::{RuleSection, RulesConfig};
use crate::rule::ports::TaskTracker;

/// Builds a rule from its configuration section.
pub type RuleConstructor = fn(&RuleSection) -> Result<Box<dyn Rule>, RuleConfigError>;

/// Mapping from rule type tag to constructor.
///
/// Tags are matched case-insensitively after trimming.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    constructors: BTreeMap<String, RuleConstructor>,
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in rule type.
    #[must_use]
    pub fn with_builtin_rules() -> Self {
        MOVE_TASKS_RULE_TYPES
            .into_iter()
            .fold(Self::new(), |registry, tag| {
                registry.with_rule(tag, MoveTasksRule::boxed_from_section)
            })
    }

    /// Registers a constructor for a tag, replacing any previous one.
    pub fn register(&mut self, tag: &str, constructor: RuleConstructor) {
        self.constructors.insert(normalize_tag(tag), constructor);
    }

    /// Registers a constructor for a tag and returns the registry.
    #[must_use]
    pub fn with_rule(mut self, tag: &str, constructor: RuleConstructor) -> Self {
        self.register(tag, constructor);
        self
    }

    /// Returns `true` when a constructor exists for the tag.
    #[must_use]
    pub fn supports(&self, tag: &str) -> bool {
        self.constructors.contains_key(&normalize_tag(tag))
    }

    /// Returns the registered tags in sorted order.
    pub fn rule_types(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds the rule described by a section.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::MissingRuleType`] or
    /// [`RuleConfigError::UnknownRuleType`] when the section's type cannot
    /// be dispatched, or the constructor's own error.
    pub fn build(&self, section: &RuleSection) -> Result<Box<dyn Rule>, RuleConfigError> {
        let tag = section
            .get(RULE_TYPE_KEY)
            .ok_or(RuleConfigError::MissingRuleType)?;
        let constructor = self
            .constructors
            .get(&normalize_tag(tag))
            .ok_or_else(|| RuleConfigError::UnknownRuleType(tag.to_owned()))?;
        constructor(section)
    }
}

/// A rule section that could not be turned into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Rule identifier.
    pub rule_id: String,
    /// Why loading failed.
    pub cause: RuleConfigError,
}

/// Rules built from a configuration, plus the sections that failed.
#[derive(Default)]
pub struct LoadedRules {
    /// Successfully built rules, in configuration order.
    pub rules: Vec<Box<dyn Rule>>,
    /// Sections that failed to load, in configuration order.
    pub failures: Vec<LoadFailure>,
}

impl fmt::Debug for LoadedRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule_ids: Vec<&str> = self.rules.iter().map(|rule| rule.id()).collect();
        f.debug_struct("LoadedRules")
            .field("rules", &rule_ids)
            .field("failures", &self.failures)
            .finish()
    }
}

impl LoadedRules {
    /// Returns `true` when no section was configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.failures.is_empty()
    }
}

/// Loads rules and drives each through its lifecycle.
#[derive(Debug, Clone, Default)]
pub struct RuleRunner {
    registry: RuleRegistry,
}

impl RuleRunner {
    /// Creates a runner over a registry.
    #[must_use]
    pub const fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Builds every configured rule. Sections that fail are recorded and
    /// skipped, starting with the entries the rules file could not express
    /// as sections.
    #[must_use]
    pub fn load_all(&self, config: &RulesConfig) -> LoadedRules {
        let mut loaded = LoadedRules::default();
        for malformed in config.malformed() {
            warn!(rule_id = malformed.section_id(), error = %malformed, "failed to load rule");
            loaded.failures.push(LoadFailure {
                rule_id: malformed.section_id().to_owned(),
                cause: RuleConfigError::Section(malformed.clone()),
            });
        }
        for section in config.sections() {
            match self.registry.build(section) {
                Ok(rule) => loaded.rules.push(rule),
                Err(cause) => {
                    warn!(rule_id = section.id(), error = %cause, "failed to load rule");
                    loaded.failures.push(LoadFailure {
                        rule_id: section.id().to_owned(),
                        cause,
                    });
                }
            }
        }
        info!(
            loaded = loaded.rules.len(),
            failed = loaded.failures.len(),
            "loaded rules"
        );
        loaded
    }

    /// Runs every loaded rule with "now" taken once from the clock.
    #[must_use]
    pub fn run(
        &self,
        loaded: &mut LoadedRules,
        tracker: &dyn TaskTracker,
        clock: &impl Clock,
        force_test_report_only: bool,
    ) -> RunSummary {
        self.run_at(
            loaded,
            tracker,
            clock.local().fixed_offset(),
            force_test_report_only,
        )
    }

    /// Runs every loaded rule against a fixed reference instant.
    ///
    /// Load failures are recorded first, followed by one record per rule in
    /// configuration order. A failing rule never stops the others.
    #[must_use]
    pub fn run_at(
        &self,
        loaded: &mut LoadedRules,
        tracker: &dyn TaskTracker,
        now: DateTime<FixedOffset>,
        force_test_report_only: bool,
    ) -> RunSummary {
        let mut summary = RunSummary::new(now);
        let _run = info_span!("run", run_id = %summary.run_id()).entered();

        for failure in &loaded.failures {
            summary.record(
                failure.rule_id.clone(),
                RuleRunStatus::LoadFailed(failure.cause.to_string()),
            );
        }

        let ctx = ExecutionContext::new(tracker, now, force_test_report_only);
        for rule in &mut loaded.rules {
            let status = run_rule(rule.as_mut(), &ctx);
            summary.record(rule.id().to_owned(), status);
        }

        info!(
            failed = summary.failed().count(),
            outcome = summary.outcome(),
            "run finished"
        );
        summary
    }
}

fn failure_cause(rule: &dyn Rule) -> String {
    rule.core()
        .failure()
        .unwrap_or("unknown failure")
        .to_owned()
}

fn run_rule(rule: &mut dyn Rule, ctx: &ExecutionContext<'_>) -> RuleRunStatus {
    let _span = info_span!("rule", rule_id = rule.id()).entered();

    if !rule.is_valid() {
        return RuleRunStatus::Invalid(failure_cause(rule));
    }
    if !rule.sync_and_validate_with_api(ctx.tracker) {
        return RuleRunStatus::SyncFailed(failure_cause(rule));
    }
    if !rule.is_criteria_met() {
        info!("rule criteria not met");
        return RuleRunStatus::CriteriaNotMet;
    }
    match rule.execute(ctx) {
        Ok(report) => {
            info!(
                tasks = report.decisions.len(),
                test_report_only = report.test_report_only,
                "rule executed"
            );
            RuleRunStatus::Executed(report)
        }
        Err(err) => {
            error!(error = %err, "rule execution failed");
            RuleRunStatus::ExecutionFailed {
                cause: err.to_string(),
                partial: err.into_partial_report(),
            }
        }
    }
}
