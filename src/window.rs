//! Calendar-day windows and their conversion to timestamp ranges.
//!
//! Every component maps timestamps to days through [`local_day`] with the one
//! configured offset, so dashboards, reports and listings agree on which day
//! an entry belongs to.

use serde::{Deserialize, Serialize};
use time::macros::date;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::AppError;

/// Longest window a single request may ask for.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Accepted calendar range. Keeps window arithmetic (previous period, local
/// midnight after the end) well inside what `time` can represent.
pub const EARLIEST_DAY: Date = date!(1900 - 01 - 01);
pub const LATEST_DAY: Date = date!(9000 - 12 - 31);

fn check_bounds(day: Date) -> Result<Date, AppError> {
    if (EARLIEST_DAY..=LATEST_DAY).contains(&day) {
        Ok(day)
    } else {
        Err(AppError::Validation(format!(
            "date {day} outside {EARLIEST_DAY}..={LATEST_DAY}"
        )))
    }
}

/// Inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

/// Half-open `[start, end)` timestamp range used in query predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

pub fn local_day(ts: OffsetDateTime, offset: UtcOffset) -> Date {
    ts.to_offset(offset).date()
}

pub fn today(offset: UtcOffset) -> Date {
    local_day(OffsetDateTime::now_utc(), offset)
}

impl DateWindow {
    pub fn new(start: Date, end: Date) -> Result<Self, AppError> {
        check_bounds(start)?;
        check_bounds(end)?;
        if start > end {
            return Err(AppError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let window = Self { start, end };
        if window.len() > MAX_WINDOW_DAYS {
            return Err(AppError::Validation(format!(
                "date range longer than {MAX_WINDOW_DAYS} days"
            )));
        }
        Ok(window)
    }

    /// The `days` days ending on `end`, inclusive. `days` is clamped to
    /// `1..=MAX_WINDOW_DAYS`; an `end` that leaves no room is rejected.
    pub fn ending_on(end: Date, days: i64) -> Result<Self, AppError> {
        let end = check_bounds(end)?;
        let start = end
            .checked_sub(Duration::days(days.clamp(1, MAX_WINDOW_DAYS) - 1))
            .ok_or_else(|| AppError::Validation(format!("no {days}-day window ends on {end}")))?;
        Self::new(start, end)
    }

    /// Number of calendar days covered.
    pub fn len(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }

    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = Date> {
        let start = self.start;
        let end = self.end;
        std::iter::successors(Some(start), move |d| d.next_day().filter(|n| *n <= end))
            .take_while(move |d| *d <= end)
    }

    /// Window of the same length immediately before this one.
    pub fn previous(&self) -> Result<Self, AppError> {
        let end = self
            .start
            .previous_day()
            .ok_or_else(|| AppError::Validation(format!("no period before {}", self.start)))?;
        Self::ending_on(end, self.len())
    }

    /// Local midnight of `start` up to local midnight after `end`.
    pub fn to_range(&self, offset: UtcOffset) -> TimeRange {
        let at_midnight =
            |d: Date| PrimitiveDateTime::new(d, Time::MIDNIGHT).assume_offset(offset);
        TimeRange {
            start: at_midnight(self.start),
            end: at_midnight(self.end) + Duration::days(1),
        }
    }
}

impl WindowQuery {
    /// Fills missing bounds: no end means today, no start means
    /// `default_days` ending on the end date. An end in the future is pulled
    /// back to today so the last day of the window is one that can have data.
    pub fn resolve(&self, today: Date, default_days: i64) -> Result<DateWindow, AppError> {
        let end = self.end_date.map_or(today, |d| d.min(today));
        let start = match self.start_date {
            Some(start) => start,
            None => DateWindow::ending_on(end, default_days)?.start,
        };
        DateWindow::new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn days_are_inclusive() {
        let w = DateWindow::new(date!(2024 - 01 - 30), date!(2024 - 02 - 02)).unwrap();
        let days: Vec<Date> = w.days().collect();
        assert_eq!(w.len(), 4);
        assert_eq!(
            days,
            vec![
                date!(2024 - 01 - 30),
                date!(2024 - 01 - 31),
                date!(2024 - 02 - 01),
                date!(2024 - 02 - 02)
            ]
        );
    }

    #[test]
    fn single_day_window() {
        let w = DateWindow::new(date!(2024 - 03 - 10), date!(2024 - 03 - 10)).unwrap();
        assert_eq!(w.days().count(), 1);
    }

    #[test]
    fn reversed_window_is_rejected() {
        let err = DateWindow::new(date!(2024 - 01 - 03), date!(2024 - 01 - 01)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        assert!(DateWindow::new(date!(2022 - 01 - 01), date!(2024 - 01 - 01)).is_err());
    }

    #[test]
    fn previous_window_has_same_length() {
        let w = DateWindow::new(date!(2024 - 01 - 08), date!(2024 - 01 - 14)).unwrap();
        let p = w.previous().unwrap();
        assert_eq!(p.start, date!(2024 - 01 - 01));
        assert_eq!(p.end, date!(2024 - 01 - 07));
    }

    #[test]
    fn range_uses_local_midnight() {
        let w = DateWindow::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02)).unwrap();
        let r = w.to_range(offset!(-3));
        assert_eq!(r.start, datetime!(2024-01-01 03:00 UTC));
        assert_eq!(r.end, datetime!(2024-01-03 03:00 UTC));
    }

    #[test]
    fn late_evening_utc_belongs_to_local_day() {
        // 01:30 UTC on the 2nd is still the evening of the 1st at -03:00.
        let ts = datetime!(2024-01-02 01:30 UTC);
        assert_eq!(local_day(ts, offset!(-3)), date!(2024 - 01 - 01));
        assert_eq!(local_day(ts, UtcOffset::UTC), date!(2024 - 01 - 02));
    }

    #[test]
    fn query_defaults_to_trailing_window() {
        let q = WindowQuery::default();
        let w = q.resolve(date!(2024 - 05 - 10), 7).unwrap();
        assert_eq!(w.start, date!(2024 - 05 - 04));
        assert_eq!(w.end, date!(2024 - 05 - 10));
    }

    #[test]
    fn future_end_is_clamped_to_today() {
        let q = WindowQuery {
            start_date: Some(date!(2024 - 05 - 08)),
            end_date: Some(date!(2024 - 06 - 30)),
        };
        let w = q.resolve(date!(2024 - 05 - 10), 7).unwrap();
        assert_eq!(w.end, date!(2024 - 05 - 10));
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn start_after_today_is_rejected() {
        let q = WindowQuery {
            start_date: Some(date!(2024 - 06 - 01)),
            end_date: Some(date!(2024 - 06 - 30)),
        };
        assert!(q.resolve(date!(2024 - 05 - 10), 7).is_err());
    }

    #[test]
    fn extreme_dates_are_validation_errors() {
        let latest = WindowQuery {
            start_date: Some(date!(9999 - 12 - 31)),
            end_date: Some(date!(9999 - 12 - 31)),
        };
        let err = latest.resolve(date!(9999 - 12 - 31), 7).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let earliest = WindowQuery {
            start_date: None,
            end_date: Some(date!(-9999 - 01 - 01)),
        };
        let err = earliest.resolve(date!(2024 - 05 - 10), 7).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(DateWindow::new(date!(9999 - 12 - 31), date!(9999 - 12 - 31)).is_err());
    }

    #[test]
    fn window_at_latest_day_converts_to_range() {
        let w = DateWindow::new(LATEST_DAY, LATEST_DAY).unwrap();
        let r = w.to_range(offset!(-3));
        assert_eq!(r.end - r.start, Duration::days(1));
    }

    #[test]
    fn no_previous_period_before_earliest_day() {
        let w = DateWindow::new(EARLIEST_DAY, date!(1900 - 01 - 10)).unwrap();
        assert!(matches!(w.previous(), Err(AppError::Validation(_))));
    }

    #[test]
    fn oversized_default_length_is_clamped() {
        let w = DateWindow::ending_on(date!(2024 - 12 - 31), 10_000).unwrap();
        assert_eq!(w.len(), MAX_WINDOW_DAYS);
    }
}
