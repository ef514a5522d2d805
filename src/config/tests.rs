//! Tests for configuration loading and value parsing.

use super::*;
use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use chrono::NaiveTime;
use rstest::{fixture, rstest};

#[rstest]
#[case("yes", Some(true))]
#[case("ON", Some(true))]
#[case("1", Some(true))]
#[case(" False ", Some(false))]
#[case("off", Some(false))]
#[case("maybe", None)]
fn parse_bool_accepts_configparser_spellings(#[case] input: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(input), expected);
}

#[rstest]
fn name_lists_split_on_newlines_and_strip_quotes() {
    let names = parse_name_list("\"Inbox, urgent\"\n  'Later'  \n\nDone");

    assert_eq!(names, vec!["Inbox, urgent", "Later", "Done"]);
}

#[rstest]
fn clock_times_require_hours_and_minutes() {
    assert_eq!(parse_clock_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
    assert_eq!(parse_clock_time("9.30"), None);
}

#[rstest]
fn blank_values_read_as_absent() {
    let section = RuleSection::new(" promote ").with("Project Name", "   ");

    assert_eq!(section.id(), "promote");
    assert_eq!(section.get("project name"), None);
}

#[rstest]
fn invalid_bool_reports_key_and_value() {
    let section = RuleSection::new("r").with("no due date", "perhaps");

    let result = section.get_bool("no due date");

    assert_eq!(
        result,
        Err(ValueError::InvalidBool {
            key: "no due date".to_owned(),
            value: "perhaps".to_owned(),
        })
    );
}

#[rstest]
fn rules_file_flattens_values_in_file_order() {
    let text = r#"
        ["zeta rule"]
        "rule type" = "move tasks"
        "no due date" = true
        "src sections include gids" = [12, 34]

        [alpha]
        "rule type" = "auto promote"
    "#;

    let config = RulesConfig::from_toml_str(text).expect("rules should parse");
    let ids: Vec<&str> = config.sections().iter().map(RuleSection::id).collect();
    let first = config.sections().first().expect("first section");

    assert_eq!(ids, vec!["zeta rule", "alpha"]);
    assert_eq!(first.get("no due date"), Some("true"));
    assert_eq!(first.get_id_list("src sections include gids"), vec!["12", "34"]);
}

#[rstest]
fn nested_tables_only_set_aside_their_section() {
    let text = r#"
        [rule]
        "rule type" = "move tasks"
        [rule.extra]
        key = "value"

        [other]
        "rule type" = "move tasks"
    "#;

    let config = RulesConfig::from_toml_str(text).expect("rules should parse");

    assert_eq!(
        config.malformed(),
        [SectionError::NestedTable {
            section: "rule".to_owned(),
            key: "extra".to_owned(),
        }]
    );
    let ids: Vec<&str> = config.sections().iter().map(RuleSection::id).collect();
    assert_eq!(ids, vec!["other"]);
}

#[rstest]
fn top_level_scalars_are_set_aside() {
    let config = RulesConfig::from_toml_str("stray = 1").expect("rules should parse");

    assert!(config.sections().is_empty());
    assert_eq!(
        config.malformed().first().map(SectionError::section_id),
        Some("stray")
    );
}

#[rstest]
fn environment_token_overrides_secrets_file() {
    let secrets = Secrets::from_toml_str("[asana]\n\"personal access token\" = \"file-token\"")
        .expect("secrets should parse");

    assert_eq!(
        secrets.asana_token(Some("env-token".to_owned())).ok(),
        Some("env-token".to_owned())
    );
    assert_eq!(
        secrets.asana_token(Some("  ".to_owned())).ok(),
        Some("file-token".to_owned())
    );
}

#[rstest]
fn missing_token_is_an_error() {
    let result = Secrets::default().asana_token(None);

    assert!(matches!(result, Err(ConfigError::MissingToken)));
}

struct ScratchDir {
    path: Utf8PathBuf,
    dir: Dir,
}

#[fixture]
fn scratch_dir() -> ScratchDir {
    let base = Utf8PathBuf::from_path_buf(std::env::temp_dir()).expect("utf-8 temp dir");
    let path = base.join(format!("tasksweep-{}", uuid::Uuid::new_v4()));
    Dir::create_ambient_dir_all(&path, ambient_authority()).expect("create scratch dir");
    let dir = Dir::open_ambient_dir(&path, ambient_authority()).expect("open scratch dir");
    ScratchDir { path, dir }
}

#[rstest]
fn load_reads_rules_and_tolerates_missing_secrets(scratch_dir: ScratchDir) {
    scratch_dir
        .dir
        .write(RULES_FILE_NAME, "[only]\n\"rule type\" = \"move tasks\"\n")
        .expect("write rules");

    let rules = RulesConfig::load(&scratch_dir.path).expect("rules should load");
    let secrets = Secrets::load(&scratch_dir.path).expect("missing secrets are empty");

    assert_eq!(rules.sections().len(), 1);
    assert_eq!(secrets, Secrets::default());
}

#[rstest]
fn load_reports_missing_rules_file(scratch_dir: ScratchDir) {
    let result = RulesConfig::load(&scratch_dir.path);

    assert!(matches!(result, Err(ConfigError::Read { .. })));
}
