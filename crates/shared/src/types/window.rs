//! Time filters and the windows they derive to.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time filter token accepted by analytics endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    /// The current civil day.
    Day,
    /// The last 7 days, inclusive.
    Week,
    /// The last 30 days, inclusive.
    Month,
    /// Unbounded start.
    #[default]
    Overall,
}

impl TimeFilter {
    /// Derives the closed interval `[start, end]` for this filter anchored
    /// at `as_of`. `Overall` has no start.
    #[must_use]
    pub fn window(self, as_of: NaiveDate) -> TimeWindow {
        let start = match self {
            Self::Day => Some(as_of),
            Self::Week => as_of.checked_sub_days(Days::new(6)),
            Self::Month => as_of.checked_sub_days(Days::new(29)),
            Self::Overall => None,
        };
        TimeWindow { start, end: as_of }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Overall => "overall",
        };
        f.write_str(name)
    }
}

/// A closed time interval. Boundaries are inclusive at both ends of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First day of the window; `None` means unbounded.
    pub start: Option<NaiveDate>,
    /// Last day of the window.
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Whether a window start is active (i.e., the filter was not `overall`).
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.start.is_some()
    }

    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overall_is_unbounded() {
        let w = TimeFilter::Overall.window(date(2024, 6, 1));
        assert!(!w.is_bounded());
        assert!(w.contains(date(1990, 1, 1)));
        assert!(!w.contains(date(2024, 6, 2)));
    }

    #[test]
    fn test_day_window() {
        let w = TimeFilter::Day.window(date(2024, 6, 1));
        assert_eq!(w.start, Some(date(2024, 6, 1)));
        assert_eq!(w.end, date(2024, 6, 1));
    }

    #[test]
    fn test_week_window_inclusive() {
        let w = TimeFilter::Week.window(date(2024, 6, 7));
        assert_eq!(w.start, Some(date(2024, 6, 1)));
        assert!(w.contains(date(2024, 6, 1)));
        assert!(w.contains(date(2024, 6, 7)));
        assert!(!w.contains(date(2024, 5, 31)));
    }

    #[test]
    fn test_month_window() {
        let w = TimeFilter::Month.window(date(2024, 6, 30));
        assert_eq!(w.start, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_default_is_overall() {
        assert_eq!(TimeFilter::default(), TimeFilter::Overall);
    }
}
