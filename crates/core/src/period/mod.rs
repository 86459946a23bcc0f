//! Calendar windows for daily/weekly/monthly totals.

use chrono::{Days, Months, NaiveDate};

/// An inclusive span of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Returns true if the given date falls within this window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The seven-day window starting at `start`.
///
/// Returns `None` only when the window would overflow the representable
/// date range.
#[must_use]
pub fn week_window(start: NaiveDate) -> Option<DateWindow> {
    let end = start.checked_add_days(Days::new(6))?;
    Some(DateWindow { start, end })
}

/// The calendar-month window for `year`/`month` (1-12).
///
/// Returns `None` for an invalid month.
#[must_use]
pub fn month_window(year: i32, month: u32) -> Option<DateWindow> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some(DateWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2026, 1, 1), date(2026, 1, 7))]
    #[case(date(2024, 2, 26), date(2024, 3, 3))]
    #[case(date(2025, 12, 29), date(2026, 1, 4))]
    fn test_week_window_spans_seven_days(#[case] start: NaiveDate, #[case] expected_end: NaiveDate) {
        let window = week_window(start).unwrap();
        assert_eq!(window.start, start);
        assert_eq!(window.end, expected_end);
        assert_eq!((window.end - window.start).num_days(), 6);
    }

    #[rstest]
    #[case(2024, 2, 29)] // leap year
    #[case(2023, 2, 28)]
    #[case(2026, 12, 31)]
    #[case(2026, 4, 30)]
    fn test_month_window_last_day(#[case] year: i32, #[case] month: u32, #[case] last_day: u32) {
        let window = month_window(year, month).unwrap();
        assert_eq!(window.start, date(year, month, 1));
        assert_eq!(window.end, date(year, month, last_day));
    }

    #[rstest]
    #[case(2026, 0)]
    #[case(2026, 13)]
    fn test_month_window_rejects_invalid_month(#[case] year: i32, #[case] month: u32) {
        assert!(month_window(year, month).is_none());
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = month_window(2026, 8).unwrap();
        assert!(window.contains(date(2026, 8, 1)));
        assert!(window.contains(date(2026, 8, 31)));
        assert!(!window.contains(date(2026, 7, 31)));
        assert!(!window.contains(date(2026, 9, 1)));
    }
}
