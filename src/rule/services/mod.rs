//! Rule lifecycle, the move-tasks rule, and the runner that drives them.

mod lifecycle;
mod move_tasks;
mod registry;
mod report;

pub use lifecycle::{
    ExecutionContext, RULE_TYPE_KEY, Rule, RuleConfigError, RuleCore, RuleExecutionError,
    RuleSyncError, TEST_REPORT_ONLY_KEY, Validity,
};
pub use move_tasks::{Designator, MOVE_TASKS_RULE_TYPES, MoveTasksParams, MoveTasksRule};
pub use registry::{LoadFailure, LoadedRules, RuleConstructor, RuleRegistry, RuleRunner};
pub use report::{
    MoveDecision, RuleReport, RuleRunRecord, RuleRunStatus, RunSummary, SummaryRenderError,
};
