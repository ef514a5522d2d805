//! Given steps for rule runner BDD scenarios.

use std::fmt::Write as _;

use chrono::NaiveDate;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasksweep::rule::domain::{ScopeId, SectionId, Task};

use super::world::{PROJECT_SECTIONS, RunnerWorld, WORKSPACE_ID, slug};

#[given(r#"the "{project}" project in the "{workspace}" workspace"#)]
fn project_in_workspace(world: &mut RunnerWorld, project: String, workspace: String) {
    let scope = ScopeId::new(format!("p-{}", slug(&project)));
    let sections: Vec<(String, SectionId)> = PROJECT_SECTIONS
        .iter()
        .map(|name| {
            (
                (*name).to_owned(),
                SectionId::new(format!("{scope}-{}", slug(name))),
            )
        })
        .collect();

    let seeded_scope = scope.clone();
    let seeded_sections = sections.clone();
    world.seed(move |tracker| {
        seeded_sections.into_iter().fold(
            tracker
                .with_workspace(WORKSPACE_ID, workspace)
                .with_project(WORKSPACE_ID, seeded_scope.clone(), project),
            |seeded, (name, id)| seeded.with_section(seeded_scope.clone(), id, name),
        )
    });
    for (name, id) in sections {
        world.sections.insert((scope.clone(), name), id);
    }
    world.current_project = Some(scope);
}

#[given(r#"the "{project}" project cannot be reached"#)]
fn project_unreachable(world: &mut RunnerWorld, project: String) {
    let scope = ScopeId::new(format!("p-{}", slug(&project)));
    world.seed(|tracker| tracker.with_failing_scope(scope, "connection reset"));
}

#[given(r#"a task "{task}" due on "{due}" in section "{section}""#)]
fn task_due_in_section(
    world: &mut RunnerWorld,
    task: String,
    due: String,
    section: String,
) -> Result<(), eyre::Report> {
    let due_on = NaiveDate::parse_from_str(&due, "%Y-%m-%d").wrap_err("parse due date")?;
    let section_id = world.section_named(&section)?;
    let scope = world
        .current_project
        .clone()
        .ok_or_else(|| eyre::eyre!("no project in scenario world"))?;
    let seeded = Task::new(task.clone(), task)
        .with_due_on(due_on)
        .in_section(section_id);
    world.seed(|tracker| tracker.with_task(scope, seeded));
    Ok(())
}

#[given(
    r#"a rule "{rule}" moving tasks of "{project}" due within "{window}" into "{destination}""#
)]
fn move_rule(
    world: &mut RunnerWorld,
    rule: String,
    project: String,
    window: String,
    destination: String,
) -> Result<(), eyre::Report> {
    write!(
        world.rules_toml,
        r#"
[{rule}]
"rule type" = "move tasks"
"workspace gid" = "{WORKSPACE_ID}"
"project name" = "{project}"
"max time until due" = "{window}"
"src sections exclude names" = ["{destination}"]
"dst section name" = "{destination}"
"#
    )
    .wrap_err("append rule section")?;
    Ok(())
}

#[given(r#"a rule section "{rule}" without a rule type"#)]
fn untyped_rule(world: &mut RunnerWorld, rule: String) -> Result<(), eyre::Report> {
    write!(
        world.rules_toml,
        r#"
[{rule}]
"workspace gid" = "{WORKSPACE_ID}"
"#
    )
    .wrap_err("append rule section")?;
    Ok(())
}
