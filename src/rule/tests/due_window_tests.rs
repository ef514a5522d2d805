//! Unit tests for due window construction and membership.

use crate::rule::domain::{
    DueWindow, DueWindowError, ResolvedDueWindow, Task, TimeframeError, build_due_window,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-10T15:30:00+02:00").expect("valid reference")
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

fn day(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("valid date")
}

fn utc(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("valid instant")
        .with_timezone(&Utc)
}

fn resolved(
    min: Option<&str>,
    max: Option<&str>,
    assumed_min: Option<NaiveTime>,
    assumed_max: Option<NaiveTime>,
    now: DateTime<FixedOffset>,
) -> ResolvedDueWindow {
    build_due_window(min, max, false, assumed_min, assumed_max)
        .expect("window should build")
        .resolve(now)
        .expect("window should resolve")
}

// ── construction ────────────────────────────────────────────────────

#[rstest]
#[case(Some("1d"), None, None)]
#[case(None, Some("2w"), None)]
#[case(None, None, Some(clock(9, 0)))]
fn no_due_date_conflicts_with_bounds(
    #[case] min: Option<&str>,
    #[case] max: Option<&str>,
    #[case] assumed_min: Option<NaiveTime>,
) {
    let result = build_due_window(min, max, true, assumed_min, None);

    assert!(matches!(result, Err(DueWindowError::TimeframeArgDupe(_))));
}

#[rstest]
fn no_due_date_alone_builds_no_due_date_window() {
    assert_eq!(
        build_due_window(None, Some("  "), true, None, None),
        Ok(DueWindow::NoDueDate)
    );
}

#[rstest]
fn blank_bounds_build_an_open_window() {
    assert_eq!(
        build_due_window(Some(""), Some(" "), false, None, None),
        Ok(DueWindow::open())
    );
}

#[rstest]
fn assumed_time_needs_its_bound() {
    let result = build_due_window(None, Some("1d"), false, Some(clock(9, 0)), None);

    assert_eq!(result, Err(DueWindowError::AssumedTimeWithoutBound("min")));
}

#[rstest]
fn malformed_bound_is_reported() {
    let result = build_due_window(Some("1 fortnight"), None, false, None, None);

    assert!(matches!(result, Err(DueWindowError::Timeframe(_))));
}

// ── membership ──────────────────────────────────────────────────────

#[rstest]
#[case("2024-01-09", false)]
#[case("2024-01-10", true)]
#[case("2024-01-11", false)]
fn today_window_admits_tasks_due_today(
    now: DateTime<FixedOffset>,
    #[case] due: &str,
    #[case] expected: bool,
) {
    let window = resolved(Some("0d"), Some("0d"), None, None, now);
    let task = Task::new("t1", "dated").with_due_on(day(due));

    assert_eq!(window.contains(&task), expected);
}

#[rstest]
#[case("2024-01-09T22:00:00Z", true)]
#[case("2024-01-10T21:59:59Z", true)]
#[case("2024-01-10T22:00:00Z", false)]
#[case("2024-01-09T21:59:59Z", false)]
fn timed_tasks_are_compared_in_the_reference_offset(
    now: DateTime<FixedOffset>,
    #[case] due: &str,
    #[case] expected: bool,
) {
    let window = resolved(Some("0d"), Some("0d"), None, None, now);
    let task = Task::new("t1", "timed").with_due_at(utc(due));

    assert_eq!(window.contains(&task), expected);
}

#[rstest]
fn tasks_without_due_date_only_match_no_due_date_windows(now: DateTime<FixedOffset>) {
    let undated = Task::new("t1", "undated");
    let dated = Task::new("t2", "dated").with_due_on(day("2024-01-10"));
    let no_due = DueWindow::NoDueDate.resolve(now).expect("resolves");
    let open = DueWindow::open().resolve(now).expect("resolves");

    assert!(no_due.matches_no_due_date());
    assert!(no_due.contains(&undated));
    assert!(!no_due.contains(&dated));
    assert!(open.contains(&dated));
    assert!(!open.contains(&undated));
}

#[rstest]
#[case("2024-01-10", true)]
#[case("2024-01-11", false)]
fn assumed_time_places_dated_tasks_on_the_clock(
    now: DateTime<FixedOffset>,
    #[case] due: &str,
    #[case] expected: bool,
) {
    let window = resolved(None, Some("0d"), None, Some(clock(9, 0)), now);
    let task = Task::new("t1", "dated").with_due_on(day(due));

    assert_eq!(window.contains(&task), expected);
}

#[rstest]
fn assumed_time_does_not_apply_to_timed_tasks(now: DateTime<FixedOffset>) {
    let window = resolved(None, Some("0d"), None, Some(clock(9, 0)), now);
    let task = Task::new("t1", "timed").with_due_at(utc("2024-01-10T10:00:00Z"));

    assert!(window.contains(&task));
}

#[rstest]
#[case(None, Some("2h"), "2024-01-10", true)]
#[case(None, Some("2h"), "2024-01-11", false)]
#[case(Some("-2h"), None, "2024-01-10", true)]
#[case(Some("-2h"), None, "2024-01-09", false)]
fn timed_bounds_give_dated_tasks_the_whole_day(
    now: DateTime<FixedOffset>,
    #[case] min: Option<&str>,
    #[case] max: Option<&str>,
    #[case] due: &str,
    #[case] expected: bool,
) {
    let window = resolved(min, max, None, None, now);
    let task = Task::new("t1", "dated").with_due_on(day(due));

    assert_eq!(window.contains(&task), expected);
}

#[rstest]
fn open_ends_use_extreme_instants(now: DateTime<FixedOffset>) {
    let window = resolved(Some("0d"), None, None, None, now);

    let (lower, upper) = window.effective_bounds();

    assert_eq!(
        lower,
        DateTime::parse_from_rfc3339("2024-01-10T00:00:00+02:00").expect("valid instant")
    );
    assert_eq!(upper, DateTime::<Utc>::MAX_UTC);
}

#[rstest]
fn upper_edge_past_the_last_instant_is_out_of_range() {
    let behind_utc =
        DateTime::parse_from_rfc3339("2024-01-10T15:30:00-05:00").expect("valid reference");
    let window = build_due_window(None, Some("260118y355d"), false, None, None)
        .expect("window should build");

    let result = window.resolve(behind_utc);

    assert!(matches!(result, Err(TimeframeError::OutOfRange(_))));
}

#[rstest]
fn dated_tasks_on_the_last_day_compare_against_timed_bounds() {
    let behind_utc =
        DateTime::parse_from_rfc3339("2024-01-10T15:30:00-05:00").expect("valid reference");
    let window = resolved(Some("260118y354d0h"), None, None, None, behind_utc);
    let task = Task::new("t1", "last day").with_due_on(NaiveDate::MAX);

    assert!(window.contains(&task));
}
