//! When steps for rule runner BDD scenarios.

use chrono::DateTime;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use tasksweep::{
    config::RulesConfig,
    rule::services::{RuleRegistry, RuleRunner},
};

use super::world::RunnerWorld;

fn run_rules(world: &mut RunnerWorld, at: &str, report_only: bool) -> Result<(), eyre::Report> {
    let now = DateTime::parse_from_rfc3339(at).wrap_err("parse run instant")?;
    let config = RulesConfig::from_toml_str(&world.rules_toml).wrap_err("parse rules file")?;
    let runner = RuleRunner::new(RuleRegistry::with_builtin_rules());
    let mut loaded = runner.load_all(&config);
    world.summary = Some(runner.run_at(&mut loaded, &world.tracker, now, report_only));
    Ok(())
}

#[when(r#"the rules run at "{at}""#)]
fn rules_run(world: &mut RunnerWorld, at: String) -> Result<(), eyre::Report> {
    run_rules(world, &at, false)
}

#[when(r#"the rules run in report-only mode at "{at}""#)]
fn rules_run_report_only(world: &mut RunnerWorld, at: String) -> Result<(), eyre::Report> {
    run_rules(world, &at, true)
}
