//! Relative duration expressions and their resolution to date boundaries.
//!
//! A timeframe such as `1w2d` or `-3 hours` is written by people in the
//! rules file. It is decomposed into signed unit counts and later added to a
//! reference instant to obtain a [`DueBound`].

use super::TimeframeError;
use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use std::fmt;

/// Units recognised in timeframe expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Minutes (`m`, `minute`, `minutes`).
    Minute,
    /// Hours (`h`, `hour`, `hours`).
    Hour,
    /// Days (`d`, `day`, `days`).
    Day,
    /// Weeks (`w`, `week`, `weeks`).
    Week,
    /// Calendar months (`M`, `month`, `months`).
    Month,
    /// Calendar years (`y`, `year`, `years`).
    Year,
}

impl TimeUnit {
    /// Units in canonical display order, largest first.
    pub const DISPLAY_ORDER: [Self; 6] = [
        Self::Year,
        Self::Month,
        Self::Week,
        Self::Day,
        Self::Hour,
        Self::Minute,
    ];

    /// Returns the case-sensitive short key.
    #[must_use]
    pub const fn short_key(self) -> char {
        match self {
            Self::Minute => 'm',
            Self::Hour => 'h',
            Self::Day => 'd',
            Self::Week => 'w',
            Self::Month => 'M',
            Self::Year => 'y',
        }
    }

    /// Returns the singular long key.
    #[must_use]
    pub const fn long_key(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Parses a unit key. Short keys are case-sensitive; long keys are not
    /// and may be singular or plural.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "m" => return Some(Self::Minute),
            "h" => return Some(Self::Hour),
            "d" => return Some(Self::Day),
            "w" => return Some(Self::Week),
            "M" => return Some(Self::Month),
            "y" => return Some(Self::Year),
            _ => {}
        }
        let lowered = key.to_ascii_lowercase();
        let singular = lowered.strip_suffix('s').unwrap_or(&lowered);
        Self::DISPLAY_ORDER
            .into_iter()
            .find(|unit| unit.long_key() == singular)
    }

    const fn slot(self) -> usize {
        match self {
            Self::Minute => 0,
            Self::Hour => 1,
            Self::Day => 2,
            Self::Week => 3,
            Self::Month => 4,
            Self::Year => 5,
        }
    }
}

/// A signed, unit-decomposed relative duration.
///
/// Each unit is tracked as present or absent, so `0h` (a date-time
/// boundary) stays distinct from `0d` (a date-only boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timeframe {
    counts: [Option<i64>; 6],
}

impl Timeframe {
    /// Returns a copy with the given unit count set.
    ///
    /// # Errors
    ///
    /// Returns [`TimeframeError::MixedSigns`] when `count` has the opposite
    /// sign to a component already present. Zero counts fit either sign.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tasksweep::rule::domain::{TimeUnit, Timeframe, TimeframeError};
    ///
    /// let back = Timeframe::default().with(TimeUnit::Day, -1).expect("single sign");
    /// let mixed = back.with(TimeUnit::Hour, 2);
    /// assert!(matches!(mixed, Err(TimeframeError::MixedSigns(_))));
    /// ```
    pub fn with(mut self, unit: TimeUnit, count: i64) -> Result<Self, TimeframeError> {
        let conflicts = self
            .counts
            .iter()
            .flatten()
            .any(|present| present.signum() * count.signum() < 0);
        if conflicts {
            return Err(TimeframeError::MixedSigns(format!(
                "{self} {count:+}{}",
                unit.short_key()
            )));
        }
        if let Some(slot) = self.counts.get_mut(unit.slot()) {
            *slot = Some(count);
        }
        Ok(self)
    }

    /// Returns the count for a unit, if present.
    #[must_use]
    pub fn count(&self, unit: TimeUnit) -> Option<i64> {
        self.counts.get(unit.slot()).copied().flatten()
    }

    /// Returns the count for a unit, treating absence as zero.
    #[must_use]
    pub fn count_or_zero(&self, unit: TimeUnit) -> i64 {
        self.count(unit).unwrap_or(0)
    }

    /// Returns `true` when a minute or hour component is present, making the
    /// timeframe resolve to a date-time rather than a date.
    #[must_use]
    pub fn has_time(&self) -> bool {
        self.count(TimeUnit::Minute).is_some() || self.count(TimeUnit::Hour).is_some()
    }

    fn is_negative(&self) -> bool {
        self.counts.iter().flatten().any(|count| *count < 0)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        let mut wrote_any = false;
        for unit in TimeUnit::DISPLAY_ORDER {
            if let Some(count) = self.count(unit) {
                write!(f, "{}{}", count.unsigned_abs(), unit.short_key())?;
                wrote_any = true;
            }
        }
        if !wrote_any {
            f.write_str("0d")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Positive,
    Negative,
}

/// Parses a timeframe expression.
///
/// Returns `Ok(None)` for empty or whitespace-only text, meaning "no bound".
///
/// # Errors
///
/// Returns [`TimeframeError`] when a component lacks a number or unit, the
/// unit is unknown or repeated, or positive and negative components mix.
///
/// # Examples
///
/// ```rust
/// use tasksweep::rule::domain::{TimeUnit, parse_timeframe};
///
/// let timeframe = parse_timeframe("-1w2d").expect("valid").expect("present");
/// assert_eq!(timeframe.count(TimeUnit::Week), Some(-1));
/// assert_eq!(timeframe.count(TimeUnit::Day), Some(-2));
/// assert_eq!(timeframe.to_string(), "-1w2d");
/// ```
pub fn parse_timeframe(text: &str) -> Result<Option<Timeframe>, TimeframeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let malformed = |reason: &str| TimeframeError::Malformed {
        text: trimmed.to_owned(),
        reason: reason.to_owned(),
    };

    let mut timeframe = Timeframe::default();
    let mut context: Option<Sign> = None;
    let mut chars = trimmed.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let explicit_sign = match chars.next_if(|c| matches!(c, '+' | '-')) {
            Some('-') => Some(Sign::Negative),
            Some(_) => Some(Sign::Positive),
            None => None,
        };

        let mut digits = String::new();
        while let Some(digit) = chars.next_if(char::is_ascii_digit) {
            digits.push(digit);
        }
        if digits.is_empty() {
            return Err(malformed("expected a number before each unit"));
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut key = String::new();
        while let Some(letter) = chars.next_if(char::is_ascii_alphabetic) {
            key.push(letter);
        }
        if key.is_empty() {
            return Err(malformed("expected a unit after each number"));
        }

        let unit = TimeUnit::from_key(&key).ok_or_else(|| TimeframeError::UnknownUnit {
            text: trimmed.to_owned(),
            unit: key.clone(),
        })?;

        let sign = match (context, explicit_sign) {
            (None, declared) => {
                let initial = declared.unwrap_or(Sign::Positive);
                context = Some(initial);
                initial
            }
            (Some(current), Some(declared)) if current != declared => {
                return Err(TimeframeError::MixedSigns(trimmed.to_owned()));
            }
            (Some(current), _) => current,
        };

        let magnitude: i64 = digits
            .parse()
            .map_err(|_| TimeframeError::OutOfRange(trimmed.to_owned()))?;
        let count = match sign {
            Sign::Positive => magnitude,
            Sign::Negative => -magnitude,
        };

        if timeframe.count(unit).is_some() {
            return Err(TimeframeError::DuplicateUnit {
                text: trimmed.to_owned(),
                unit: unit.long_key().to_owned(),
            });
        }
        timeframe = timeframe.with(unit, count)?;
    }

    Ok(Some(timeframe))
}

/// Which end of a window a bound sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundEdge {
    /// The earliest admissible due time.
    Lower,
    /// The latest admissible due time.
    Upper,
}

impl BoundEdge {
    /// Returns `"min"` or `"max"`, as used in configuration keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "min",
            Self::Upper => "max",
        }
    }
}

/// A resolved window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBound {
    /// A whole calendar day in the reference offset.
    Date {
        /// The boundary day.
        date: NaiveDate,
        /// Which end of the window this bound is.
        edge: BoundEdge,
        /// The instant the day starts (lower) or ends (upper).
        instant: DateTime<FixedOffset>,
    },
    /// An exact instant.
    DateTime(DateTime<FixedOffset>),
}

impl DueBound {
    /// Returns `true` for a date-only boundary.
    #[must_use]
    pub const fn is_date_only(&self) -> bool {
        matches!(self, Self::Date { .. })
    }

    /// Returns the calendar date of the boundary.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date { date, .. } => *date,
            Self::DateTime(instant) => instant.date_naive(),
        }
    }

    /// Returns the boundary as an instant. A lower date-only bound starts at
    /// 00:00 and an upper one ends at 23:59:59.999999.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        match self {
            Self::Date { instant, .. } | Self::DateTime(instant) => *instant,
        }
    }
}

/// Returns the implicit clock time of a date-only boundary on `edge`.
pub(crate) fn edge_time(edge: BoundEdge) -> NaiveTime {
    match edge {
        BoundEdge::Lower => NaiveTime::MIN,
        BoundEdge::Upper => end_of_day(),
    }
}

fn end_of_day() -> NaiveTime {
    let (time, _) = NaiveTime::MIN.overflowing_sub_signed(TimeDelta::microseconds(1));
    time
}

/// Combines a date and clock time in a fixed offset, or `None` when the
/// matching UTC instant is not representable.
fn at_local_time(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    date.and_time(time)
        .checked_sub_offset(offset)
        .map(|utc| offset.from_utc_datetime(&utc))
}

/// Resolves a timeframe against a reference instant.
///
/// Months and years are added with calendar-aware arithmetic (clamping to
/// the last day of a shorter month) before weeks, days, hours and minutes.
/// A timeframe without hour or minute components yields a date-only bound,
/// unless `assumed_time` is given, in which case that clock time is placed
/// on the resolved date.
///
/// # Errors
///
/// Returns [`TimeframeError::OutOfRange`] when the result, or the instant of
/// its day edge or assumed time, leaves the representable range.
///
/// # Examples
///
/// ```rust
/// use chrono::{DateTime, NaiveDate};
/// use tasksweep::rule::domain::{BoundEdge, parse_timeframe, resolve_bound};
///
/// let reference = DateTime::parse_from_rfc3339("2024-01-10T15:30:00+00:00").expect("valid");
/// let today = parse_timeframe("0d").expect("valid").expect("present");
/// let upper = resolve_bound(&today, reference, None, BoundEdge::Upper).expect("in range");
/// assert!(upper.is_date_only());
/// assert_eq!(upper.date(), NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"));
/// ```
pub fn resolve_bound(
    timeframe: &Timeframe,
    reference: DateTime<FixedOffset>,
    assumed_time: Option<NaiveTime>,
    edge: BoundEdge,
) -> Result<DueBound, TimeframeError> {
    let out_of_range = || TimeframeError::OutOfRange(timeframe.to_string());

    let months = timeframe
        .count_or_zero(TimeUnit::Year)
        .checked_mul(12)
        .and_then(|months| months.checked_add(timeframe.count_or_zero(TimeUnit::Month)))
        .ok_or_else(out_of_range)?;
    let shifted = add_months(reference, months).ok_or_else(out_of_range)?;

    let delta = [
        TimeDelta::try_weeks(timeframe.count_or_zero(TimeUnit::Week)),
        TimeDelta::try_days(timeframe.count_or_zero(TimeUnit::Day)),
        TimeDelta::try_hours(timeframe.count_or_zero(TimeUnit::Hour)),
        TimeDelta::try_minutes(timeframe.count_or_zero(TimeUnit::Minute)),
    ]
    .into_iter()
    .try_fold(TimeDelta::zero(), |total, part| {
        part.and_then(|delta| total.checked_add(&delta))
    })
    .ok_or_else(out_of_range)?;
    let resolved = shifted.checked_add_signed(delta).ok_or_else(out_of_range)?;

    if timeframe.has_time() {
        return Ok(DueBound::DateTime(resolved));
    }

    let date = resolved.date_naive();
    let offset = *resolved.offset();
    Ok(match assumed_time {
        Some(time) => DueBound::DateTime(
            at_local_time(date, time, offset).ok_or_else(out_of_range)?,
        ),
        None => DueBound::Date {
            date,
            edge,
            instant: at_local_time(date, edge_time(edge), offset).ok_or_else(out_of_range)?,
        },
    })
}

fn add_months(instant: DateTime<FixedOffset>, months: i64) -> Option<DateTime<FixedOffset>> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        instant.checked_add_months(Months::new(magnitude))
    } else {
        instant.checked_sub_months(Months::new(magnitude))
    }
}
