//! Due-date windows built from configured timeframes.

use super::{
    BoundEdge, DueBound, DueWindowError, Task, TaskDue, Timeframe, TimeframeError,
    parse_timeframe, resolve_bound, timeframe::edge_time,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// One configured side of a due window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEdge {
    timeframe: Timeframe,
    assumed_time: Option<NaiveTime>,
}

impl WindowEdge {
    /// Creates an edge from a timeframe and an optional assumed time.
    #[must_use]
    pub const fn new(timeframe: Timeframe, assumed_time: Option<NaiveTime>) -> Self {
        Self {
            timeframe,
            assumed_time,
        }
    }

    /// Returns the edge timeframe.
    #[must_use]
    pub const fn timeframe(&self) -> &Timeframe {
        &self.timeframe
    }

    /// Returns the clock time assumed for tasks that have a date but no
    /// time.
    #[must_use]
    pub const fn assumed_time(&self) -> Option<NaiveTime> {
        self.assumed_time
    }
}

/// Which tasks a due window admits, before resolution against "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    /// Only tasks without any due date.
    NoDueDate,
    /// Tasks whose due date falls between the optional inclusive bounds.
    Between {
        /// Earliest admissible due time; open when absent.
        min: Option<WindowEdge>,
        /// Latest admissible due time; open when absent.
        max: Option<WindowEdge>,
    },
}

impl DueWindow {
    /// A window admitting every task that has a due date.
    #[must_use]
    pub const fn open() -> Self {
        Self::Between {
            min: None,
            max: None,
        }
    }

    /// Resolves the configured edges against a reference instant.
    ///
    /// # Errors
    ///
    /// Returns [`TimeframeError::OutOfRange`] when an edge cannot be
    /// represented.
    pub fn resolve(
        &self,
        reference: DateTime<FixedOffset>,
    ) -> Result<ResolvedDueWindow, TimeframeError> {
        let mode = match self {
            Self::NoDueDate => ResolvedMode::NoDueDate,
            Self::Between { min, max } => ResolvedMode::Between {
                lower: min
                    .map(|edge| ResolvedEdge::resolve(&edge, reference, BoundEdge::Lower))
                    .transpose()?,
                upper: max
                    .map(|edge| ResolvedEdge::resolve(&edge, reference, BoundEdge::Upper))
                    .transpose()?,
            },
        };
        Ok(ResolvedDueWindow {
            offset: *reference.offset(),
            mode,
        })
    }
}

/// Builds a due window from configuration text.
///
/// Blank bound text means the bound is open-ended.
///
/// # Errors
///
/// Returns [`DueWindowError::TimeframeArgDupe`] when `no_due_date` is set
/// together with a bound or assumed time,
/// [`DueWindowError::AssumedTimeWithoutBound`] when an assumed time has no
/// bound to apply to, and [`DueWindowError::Timeframe`] when a bound does not
/// parse.
///
/// # Examples
///
/// ```rust
/// use tasksweep::rule::domain::{DueWindowError, build_due_window};
///
/// let conflict = build_due_window(Some("1d"), None, true, None, None);
/// assert!(matches!(conflict, Err(DueWindowError::TimeframeArgDupe(_))));
/// ```
pub fn build_due_window(
    min_text: Option<&str>,
    max_text: Option<&str>,
    no_due_date: bool,
    assumed_min_time: Option<NaiveTime>,
    assumed_max_time: Option<NaiveTime>,
) -> Result<DueWindow, DueWindowError> {
    let min = min_text.map(parse_timeframe).transpose()?.flatten();
    let max = max_text.map(parse_timeframe).transpose()?.flatten();

    if no_due_date {
        let conflicting = [
            (min.is_some(), "a min time until due"),
            (max.is_some(), "a max time until due"),
            (assumed_min_time.is_some(), "an assumed time for min due"),
            (assumed_max_time.is_some(), "an assumed time for max due"),
        ]
        .into_iter()
        .filter_map(|(present, label)| present.then_some(label))
        .collect::<Vec<_>>();
        if !conflicting.is_empty() {
            return Err(DueWindowError::TimeframeArgDupe(conflicting.join(" and ")));
        }
        return Ok(DueWindow::NoDueDate);
    }

    Ok(DueWindow::Between {
        min: build_edge(min, assumed_min_time, BoundEdge::Lower)?,
        max: build_edge(max, assumed_max_time, BoundEdge::Upper)?,
    })
}

fn build_edge(
    timeframe: Option<Timeframe>,
    assumed_time: Option<NaiveTime>,
    edge: BoundEdge,
) -> Result<Option<WindowEdge>, DueWindowError> {
    match (timeframe, assumed_time) {
        (Some(resolved), assumed) => Ok(Some(WindowEdge::new(resolved, assumed))),
        (None, Some(_)) => Err(DueWindowError::AssumedTimeWithoutBound(edge.as_str())),
        (None, None) => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedEdge {
    edge: BoundEdge,
    exact: DueBound,
    for_dated: DueBound,
    assumed_time: Option<NaiveTime>,
}

impl ResolvedEdge {
    fn resolve(
        configured: &WindowEdge,
        reference: DateTime<FixedOffset>,
        edge: BoundEdge,
    ) -> Result<Self, TimeframeError> {
        Ok(Self {
            edge,
            exact: resolve_bound(&configured.timeframe, reference, None, edge)?,
            for_dated: resolve_bound(
                &configured.timeframe,
                reference,
                configured.assumed_time,
                edge,
            )?,
            assumed_time: configured.assumed_time,
        })
    }

    fn admits_instant(&self, instant: DateTime<FixedOffset>) -> bool {
        let bound = self.exact.timestamp();
        match self.edge {
            BoundEdge::Lower => instant >= bound,
            BoundEdge::Upper => instant <= bound,
        }
    }

    fn admits_date(&self, date: NaiveDate) -> bool {
        match self.for_dated {
            DueBound::Date { date: bound, .. } => match self.edge {
                BoundEdge::Lower => date >= bound,
                BoundEdge::Upper => date <= bound,
            },
            DueBound::DateTime(bound) => {
                let task_time = self.assumed_time.unwrap_or_else(|| match self.edge {
                    BoundEdge::Lower => edge_time(BoundEdge::Upper),
                    BoundEdge::Upper => edge_time(BoundEdge::Lower),
                });
                // Both sides share the window offset.
                let task_local = date.and_time(task_time);
                match self.edge {
                    BoundEdge::Lower => task_local >= bound.naive_local(),
                    BoundEdge::Upper => task_local <= bound.naive_local(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvedMode {
    NoDueDate,
    Between {
        lower: Option<ResolvedEdge>,
        upper: Option<ResolvedEdge>,
    },
}

/// A due window resolved against a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDueWindow {
    offset: FixedOffset,
    mode: ResolvedMode,
}

impl ResolvedDueWindow {
    /// Returns `true` when the window only admits tasks without a due date.
    #[must_use]
    pub const fn matches_no_due_date(&self) -> bool {
        matches!(self.mode, ResolvedMode::NoDueDate)
    }

    /// Returns the UTC offset in which dates are interpreted.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Returns whether a task's due information falls inside the window.
    ///
    /// Bounds are inclusive. Task due instants are compared in the window's
    /// offset. Tasks with a date but no time use the assumed time for the
    /// edge being checked, or the whole day when no time is assumed.
    #[must_use]
    pub fn contains(&self, task: &Task) -> bool {
        match (self.mode, task.due()) {
            (ResolvedMode::NoDueDate, TaskDue::None) => true,
            (ResolvedMode::NoDueDate, _) | (ResolvedMode::Between { .. }, TaskDue::None) => false,
            (ResolvedMode::Between { lower, upper }, TaskDue::At { instant }) => {
                let local = instant.with_timezone(&self.offset);
                [lower, upper]
                    .into_iter()
                    .flatten()
                    .all(|edge| edge.admits_instant(local))
            }
            (ResolvedMode::Between { lower, upper }, TaskDue::On { date }) => [lower, upper]
                .into_iter()
                .flatten()
                .all(|edge| edge.admits_date(date)),
        }
    }

    /// Returns the inclusive `(min, max)` instants of the window, using the
    /// minimum and maximum representable instants for open ends.
    #[must_use]
    pub fn effective_bounds(&self) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let open_min = DateTime::<Utc>::MIN_UTC.with_timezone(&self.offset);
        let open_max = DateTime::<Utc>::MAX_UTC.with_timezone(&self.offset);
        match self.mode {
            ResolvedMode::NoDueDate => (open_min, open_max),
            ResolvedMode::Between { lower, upper } => (
                lower.map_or(open_min, |edge| edge.exact.timestamp()),
                upper.map_or(open_max, |edge| edge.exact.timestamp()),
            ),
        }
    }
}
