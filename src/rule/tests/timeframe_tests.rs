//! Unit tests for timeframe parsing and bound resolution.

use crate::rule::domain::{
    BoundEdge, DueBound, TimeUnit, Timeframe, TimeframeError, parse_timeframe, resolve_bound,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rstest::{fixture, rstest};

#[fixture]
fn reference() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-10T15:30:00+02:00").expect("valid reference")
}

fn parsed(text: &str) -> Timeframe {
    parse_timeframe(text)
        .expect("timeframe should parse")
        .expect("timeframe should be present")
}

fn at(text: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(text).expect("valid instant")
}

// ── parsing ─────────────────────────────────────────────────────────

#[rstest]
#[case("")]
#[case("   ")]
fn blank_text_means_no_bound(#[case] input: &str) {
    assert_eq!(parse_timeframe(input), Ok(None));
}

#[rstest]
#[case("1d", TimeUnit::Day, 1)]
#[case("2 weeks", TimeUnit::Week, 2)]
#[case("3 Hours", TimeUnit::Hour, 3)]
#[case("1 month", TimeUnit::Month, 1)]
#[case("4M", TimeUnit::Month, 4)]
#[case("4m", TimeUnit::Minute, 4)]
#[case("-2d", TimeUnit::Day, -2)]
#[case("+5y", TimeUnit::Year, 5)]
fn single_components_parse(#[case] input: &str, #[case] unit: TimeUnit, #[case] count: i64) {
    assert_eq!(parsed(input).count(unit), Some(count));
}

#[rstest]
fn concatenated_and_separated_components_are_summed() {
    let joined = parsed("1w1d");
    let spaced = parsed("1w, 1d");

    assert_eq!(joined, spaced);
    assert_eq!(joined.count(TimeUnit::Week), Some(1));
    assert_eq!(joined.count(TimeUnit::Day), Some(1));
    assert_eq!(joined.count(TimeUnit::Hour), None);
}

#[rstest]
fn leading_sign_applies_to_every_component() {
    let timeframe = parsed("-1w2d");

    assert_eq!(timeframe.count(TimeUnit::Week), Some(-1));
    assert_eq!(timeframe.count(TimeUnit::Day), Some(-2));
}

#[rstest]
#[case("1y2M3w4d5h6m")]
#[case("-1w2d")]
#[case("0d")]
#[case("0h")]
#[case("12h30m")]
fn canonical_text_round_trips(#[case] input: &str) {
    let timeframe = parsed(input);

    assert_eq!(timeframe.to_string(), input);
    assert_eq!(parsed(&timeframe.to_string()), timeframe);
}

#[rstest]
fn long_form_normalises_to_short_keys() {
    assert_eq!(parsed("2 days 3 hours").to_string(), "2d3h");
}

#[rstest]
fn repeated_unit_is_rejected() {
    let result = parse_timeframe("1d 2days");

    assert!(matches!(
        result,
        Err(TimeframeError::DuplicateUnit { ref unit, .. }) if unit == "day"
    ));
}

#[rstest]
#[case("1d-2h")]
#[case("-1d+2h")]
fn mixed_signs_are_rejected(#[case] input: &str) {
    assert!(matches!(
        parse_timeframe(input),
        Err(TimeframeError::MixedSigns(_))
    ));
}

#[rstest]
#[case(1, -2)]
#[case(-1, 2)]
fn building_refuses_a_second_sign(#[case] days: i64, #[case] hours: i64) {
    let timeframe = Timeframe::default()
        .with(TimeUnit::Day, days)
        .expect("single component");

    assert!(matches!(
        timeframe.with(TimeUnit::Hour, hours),
        Err(TimeframeError::MixedSigns(_))
    ));
}

#[rstest]
fn built_timeframes_display_as_parseable_text() {
    let timeframe = Timeframe::default()
        .with(TimeUnit::Day, -1)
        .and_then(|partial| partial.with(TimeUnit::Hour, 0))
        .and_then(|partial| partial.with(TimeUnit::Minute, -30))
        .expect("single sign");

    assert_eq!(parse_timeframe(&timeframe.to_string()), Ok(Some(timeframe)));
}

#[rstest]
fn repeating_the_leading_sign_is_allowed() {
    assert_eq!(parsed("-1d -2h").count(TimeUnit::Hour), Some(-2));
}

#[rstest]
#[case("3 fortnights")]
#[case("1D")]
#[case("2x")]
fn unknown_units_are_rejected(#[case] input: &str) {
    assert!(matches!(
        parse_timeframe(input),
        Err(TimeframeError::UnknownUnit { .. })
    ));
}

#[rstest]
#[case("d")]
#[case("12")]
#[case("1d 3")]
fn incomplete_components_are_malformed(#[case] input: &str) {
    assert!(matches!(
        parse_timeframe(input),
        Err(TimeframeError::Malformed { .. })
    ));
}

#[rstest]
fn time_components_mark_date_time_bounds() {
    assert!(parsed("0h").has_time());
    assert!(parsed("1d5m").has_time());
    assert!(!parsed("0d").has_time());
}

// ── resolution ──────────────────────────────────────────────────────

#[rstest]
fn zero_days_spans_the_whole_reference_day(reference: DateTime<FixedOffset>) {
    let today = parsed("0d");

    let lower = resolve_bound(&today, reference, None, BoundEdge::Lower).expect("in range");
    let upper = resolve_bound(&today, reference, None, BoundEdge::Upper).expect("in range");

    assert_eq!(lower.timestamp(), at("2024-01-10T00:00:00+02:00"));
    assert_eq!(upper.timestamp(), at("2024-01-10T23:59:59.999999+02:00"));
}

#[rstest]
fn date_only_bounds_keep_their_date(reference: DateTime<FixedOffset>) {
    let bound = resolve_bound(&parsed("1w1d"), reference, None, BoundEdge::Upper)
        .expect("in range");

    assert!(bound.is_date_only());
    assert_eq!(
        bound.date(),
        NaiveDate::from_ymd_opt(2024, 1, 18).expect("valid date")
    );
}

#[rstest]
fn time_components_resolve_to_exact_instants(reference: DateTime<FixedOffset>) {
    let bound = resolve_bound(&parsed("-1d2h"), reference, None, BoundEdge::Lower)
        .expect("in range");

    assert_eq!(bound, DueBound::DateTime(at("2024-01-09T13:30:00+02:00")));
}

#[rstest]
fn assumed_time_replaces_day_edges(reference: DateTime<FixedOffset>) {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).expect("valid time");

    let bound = resolve_bound(&parsed("1d"), reference, Some(nine), BoundEdge::Upper)
        .expect("in range");

    assert_eq!(bound, DueBound::DateTime(at("2024-01-11T09:00:00+02:00")));
}

#[rstest]
#[case("2024-01-31T12:00:00+00:00", "1M", "2024-02-29")]
#[case("2023-01-31T12:00:00+00:00", "1M", "2023-02-28")]
#[case("2024-02-29T12:00:00+00:00", "1y", "2025-02-28")]
#[case("2024-03-31T12:00:00+00:00", "-1M", "2024-02-29")]
fn months_and_years_use_calendar_arithmetic(
    #[case] start: &str,
    #[case] timeframe: &str,
    #[case] expected: &str,
) {
    let bound = resolve_bound(&parsed(timeframe), at(start), None, BoundEdge::Lower)
        .expect("in range");

    assert_eq!(bound.date().to_string(), expected);
}

#[rstest]
fn unrepresentable_results_are_out_of_range(reference: DateTime<FixedOffset>) {
    let result = resolve_bound(&parsed("9999999y"), reference, None, BoundEdge::Upper);

    assert!(matches!(result, Err(TimeframeError::OutOfRange(_))));
}

#[rstest]
#[case(BoundEdge::Upper, None)]
#[case(BoundEdge::Lower, Some(NaiveTime::from_hms_opt(23, 0, 0).expect("valid time")))]
fn day_edges_past_the_last_instant_are_out_of_range(
    #[case] edge: BoundEdge,
    #[case] assumed_time: Option<NaiveTime>,
) {
    let behind_utc = at("2024-01-10T15:30:00-05:00");

    let result = resolve_bound(&parsed("260118y355d"), behind_utc, assumed_time, edge);

    assert!(matches!(result, Err(TimeframeError::OutOfRange(_))));
}

#[rstest]
fn lower_edge_of_the_last_day_is_representable() {
    let behind_utc = at("2024-01-10T15:30:00-05:00");

    let bound = resolve_bound(&parsed("260118y355d"), behind_utc, None, BoundEdge::Lower)
        .expect("in range");

    assert_eq!(bound.date(), NaiveDate::MAX);
}
