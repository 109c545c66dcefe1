//! Trailing date window shared by both providers.

use chrono::{Days, NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window length must be at least one day")]
    ZeroLength,

    #[error("window of {days} days before {end} is out of calendar range")]
    OutOfRange { end: NaiveDate, days: u32 },
}

/// Inclusive `[start, end]` calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Window ending on `end` and starting `days` calendar days earlier.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self, WindowError> {
        if days == 0 {
            return Err(WindowError::ZeroLength);
        }
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or(WindowError::OutOfRange { end, days })?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Midnight UTC of the start date, in epoch seconds.
    pub fn start_epoch_secs(&self) -> i64 {
        midnight_utc(self.start)
    }

    /// Midnight UTC of the end date, in epoch seconds.
    pub fn end_epoch_secs(&self) -> i64 {
        midnight_utc(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn trailing_year_crosses_leap_day() {
        let w = DateWindow::trailing(d(2025, 2, 24), 365).unwrap();
        // 2024 is a leap year, so 365 days back lands on the 25th.
        assert_eq!(w.start(), d(2024, 2, 25));
        assert_eq!(w.end(), d(2025, 2, 24));
        assert_eq!(w.len_days(), 365);
    }

    #[test]
    fn zero_length_rejected() {
        assert_eq!(
            DateWindow::trailing(d(2025, 2, 24), 0),
            Err(WindowError::ZeroLength)
        );
    }

    #[test]
    fn epoch_bounds_are_midnight_utc() {
        let w = DateWindow::trailing(d(2024, 1, 2), 1).unwrap();
        assert_eq!(w.start_epoch_secs(), 1_704_067_200);
        assert_eq!(w.end_epoch_secs(), 1_704_153_600);
    }

    #[test]
    fn contains_is_inclusive() {
        let w = DateWindow::trailing(d(2024, 1, 10), 5).unwrap();
        assert!(w.contains(d(2024, 1, 5)));
        assert!(w.contains(d(2024, 1, 10)));
        assert!(!w.contains(d(2024, 1, 4)));
        assert!(!w.contains(d(2024, 1, 11)));
    }

    #[test]
    fn display_uses_iso_dates() {
        let w = DateWindow::trailing(d(2024, 1, 10), 5).unwrap();
        assert_eq!(w.to_string(), "2024-01-05..2024-01-10");
    }
}
