//! Then steps for rule runner BDD scenarios.

use rstest_bdd_macros::then;
use tasksweep::rule::{domain::TaskId, services::RuleRunStatus};

use super::world::RunnerWorld;

#[then(r#"task "{task}" is in section "{section}""#)]
fn task_in_section(
    world: &RunnerWorld,
    task: String,
    section: String,
) -> Result<(), eyre::Report> {
    let section_id = world.section_named(&section)?;
    let members = world.tracker.tasks_in_section(&section_id);
    if !members.contains(&TaskId::new(task.clone())) {
        return Err(eyre::eyre!("expected task '{task}' in '{section}', found {members:?}"));
    }
    Ok(())
}

#[then("no tasks were moved")]
fn no_tasks_moved(world: &RunnerWorld) -> Result<(), eyre::Report> {
    let moves = world.tracker.moves();
    if !moves.is_empty() {
        return Err(eyre::eyre!("expected no moves, found {moves:?}"));
    }
    Ok(())
}

#[then(r#"the summary mentions "{text}""#)]
fn summary_mentions(world: &RunnerWorld, text: String) -> Result<(), eyre::Report> {
    let rendered = world
        .summary()?
        .render_text()
        .map_err(|err| eyre::eyre!("render summary: {err}"))?;
    if !rendered.contains(&text) {
        return Err(eyre::eyre!("expected '{text}' in summary:\n{rendered}"));
    }
    Ok(())
}

#[then(r#"rule "{rule}" failed to sync"#)]
fn rule_failed_to_sync(world: &RunnerWorld, rule: String) -> Result<(), eyre::Report> {
    expect_status(world, &rule, |status| {
        matches!(status, RuleRunStatus::SyncFailed(_))
    })
}

#[then(r#"rule "{rule}" failed to load"#)]
fn rule_failed_to_load(world: &RunnerWorld, rule: String) -> Result<(), eyre::Report> {
    expect_status(world, &rule, |status| {
        matches!(status, RuleRunStatus::LoadFailed(_))
    })
}

#[then("the run completed successfully")]
fn run_succeeded(world: &RunnerWorld) -> Result<(), eyre::Report> {
    let summary = world.summary()?;
    if !summary.is_success() {
        return Err(eyre::eyre!("expected a clean run, got {:?}", summary.records()));
    }
    Ok(())
}

#[then("the run completed with errors")]
fn run_had_errors(world: &RunnerWorld) -> Result<(), eyre::Report> {
    let summary = world.summary()?;
    if summary.outcome() != "completed, but with errors" {
        return Err(eyre::eyre!("unexpected outcome '{}'", summary.outcome()));
    }
    Ok(())
}

fn expect_status(
    world: &RunnerWorld,
    rule: &str,
    expected: impl Fn(&RuleRunStatus) -> bool,
) -> Result<(), eyre::Report> {
    let record = world
        .summary()?
        .find(rule)
        .ok_or_else(|| eyre::eyre!("no record for rule '{rule}'"))?;
    if !expected(&record.status) {
        return Err(eyre::eyre!(
            "unexpected status for '{rule}': {:?}",
            record.status
        ));
    }
    Ok(())
}
