//! Month-end period calendar.
//!
//! Every period of a draw schedule is one whole calendar month. The anchor
//! date may fall on any day; it is normalised to the last day of its month
//! and period `n` lands on the month-end `n - 1` months later, so period 1
//! is the anchor month itself.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::ScheduleResult;

/// Latest year a spreadsheet date cell can hold.
pub const MAX_PERIOD_YEAR: i64 = 9999;

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), last).unwrap_or(date)
}

/// Month-end of the month `months` whole months after the month of `date`.
///
/// Falls back to `date` when the result lies outside chrono's range; callers
/// bound the term with [`Calendar::check_term`] first.
pub fn add_months_end(date: NaiveDate, months: u32) -> NaiveDate {
    let total_months = month_index(date) + i64::from(months);
    let Ok(year) = i32::try_from(total_months.div_euclid(12)) else {
        return date;
    };
    let month = (total_months.rem_euclid(12) + 1) as u32;
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)).unwrap_or(date)
}

/// Number of days in a given month/year.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Anchored month-end calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    anchor: NaiveDate,
}

impl Calendar {
    /// Anchor the calendar on the month containing `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            anchor: month_end(date),
        }
    }

    /// The normalised anchor (month-end of the input date).
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Month-end date of the 1-based `period`. Period 0 is treated as period 1.
    pub fn period_date(&self, period: u32) -> NaiveDate {
        add_months_end(self.anchor, period.saturating_sub(1))
    }

    /// Dates for periods `1..=count`.
    pub fn period_dates(&self, count: u32) -> Vec<NaiveDate> {
        (1..=count).map(|n| self.period_date(n)).collect()
    }

    /// Fail if period `term` would fall after the last representable
    /// spreadsheet date.
    pub fn check_term(&self, term: u32) -> ScheduleResult<()> {
        let last_index = month_index(self.anchor) + i64::from(term.saturating_sub(1));
        if last_index.div_euclid(12) > MAX_PERIOD_YEAR {
            return Err(ScheduleError::DateError(format!(
                "A {term}-period schedule anchored on {} runs past the year {MAX_PERIOD_YEAR}",
                self.anchor
            )));
        }
        Ok(())
    }

    /// First period whose date is not before the month-end of `date`.
    ///
    /// Dates in or before the anchor month map to period 1.
    pub fn period_on_or_after(&self, date: NaiveDate) -> u32 {
        let diff = month_index(date) - month_index(self.anchor);
        if diff <= 0 {
            1
        } else {
            u32::try_from(diff + 1).unwrap_or(u32::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_end_any_day() {
        assert_eq!(month_end(d(2024, 2, 1)), d(2024, 2, 29));
        assert_eq!(month_end(d(2023, 2, 15)), d(2023, 2, 28));
        assert_eq!(month_end(d(2024, 4, 30)), d(2024, 4, 30));
        assert_eq!(month_end(d(2024, 12, 3)), d(2024, 12, 31));
    }

    #[test]
    fn test_century_leap_rules() {
        assert_eq!(month_end(d(1900, 2, 10)), d(1900, 2, 28));
        assert_eq!(month_end(d(2000, 2, 10)), d(2000, 2, 29));
    }

    #[test]
    fn test_leap_february_anchor() {
        let cal = Calendar::new(d(2024, 2, 15));
        assert_eq!(cal.anchor(), d(2024, 2, 29));
        assert_eq!(cal.period_date(1), d(2024, 2, 29));
        assert_eq!(cal.period_date(2), d(2024, 3, 31));
        assert_eq!(cal.period_date(3), d(2024, 4, 30));
    }

    #[test]
    fn test_no_drift_after_short_month() {
        // Whole-month arithmetic: a 30-day month must not pull later dates back.
        let cal = Calendar::new(d(2023, 11, 30));
        assert_eq!(cal.period_date(2), d(2023, 12, 31));
        assert_eq!(cal.period_date(3), d(2024, 1, 31));
        assert_eq!(cal.period_date(4), d(2024, 2, 29));
        assert_eq!(cal.period_date(5), d(2024, 3, 31));
    }

    #[test]
    fn test_period_dates_consecutive() {
        let cal = Calendar::new(d(2022, 7, 4));
        let dates = cal.period_dates(36);
        assert_eq!(dates.len(), 36);
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(month_index(pair[1]) - month_index(pair[0]), 1);
            assert_eq!(month_end(pair[1]), pair[1]);
        }
    }

    #[test]
    fn test_period_on_or_after() {
        let cal = Calendar::new(d(2024, 1, 10));
        assert_eq!(cal.period_on_or_after(d(2023, 6, 1)), 1);
        assert_eq!(cal.period_on_or_after(d(2024, 1, 2)), 1);
        assert_eq!(cal.period_on_or_after(d(2024, 2, 1)), 2);
        assert_eq!(cal.period_on_or_after(d(2025, 1, 31)), 13);
    }

    #[test]
    fn test_term_past_year_9999_rejected() {
        let cal = Calendar::new(d(2024, 1, 10));
        assert!(cal.check_term(360).is_ok());
        assert!(matches!(cal.check_term(u32::MAX), Err(ScheduleError::DateError(_))));
        // no overflow on the unchecked path either
        assert_eq!(add_months_end(d(2024, 1, 10), u32::MAX), d(2024, 1, 10));
    }
}
