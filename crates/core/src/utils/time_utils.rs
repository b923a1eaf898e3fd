use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::errors::{Error, Result};

/// Clock abstracts access to the current timestamp so services remain deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current UTC date. Defaults to `now().date_naive()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real-time clock backed by the system UTC time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant. Used by tests and by tooling that replays
/// a ledger "as of" a given day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Midnight UTC on the given day.
    pub fn at_date(date: NaiveDate) -> Self {
        Self {
            now: date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// First calendar day of the month containing `date`.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Inclusive first and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::invalid_input(format!("Invalid month {}-{:02}", year, month)))?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::invalid_input(format!("Month {}-{:02} out of range", year, month)))?;
    Ok((start, end))
}

/// Adds calendar months, clamping to the last day of the target month
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// `(year, month)` pairs for every month from the month of `from` up to, but
/// not including, the month of `until`.
pub fn months_before(from: NaiveDate, until: NaiveDate) -> Vec<(i32, u32)> {
    let stop = first_day_of_month(until);
    let mut cursor = first_day_of_month(from);
    let mut months = Vec::new();
    while cursor < stop {
        months.push((cursor.year(), cursor.month()));
        match add_months(cursor, 1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    months
}

/// `YYYY-MM` label used in messages.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds_handles_leap_february() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start, d(2024, 2, 1));
        assert_eq!(end, d(2024, 2, 29));
    }

    #[test]
    fn test_month_bounds_rejects_month_13() {
        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(d(2025, 1, 31), 1), Some(d(2025, 2, 28)));
        assert_eq!(add_months(d(2025, 8, 31), 6), Some(d(2026, 2, 28)));
    }

    #[test]
    fn test_months_before_excludes_current_month() {
        let months = months_before(d(2025, 11, 20), d(2026, 2, 3));
        assert_eq!(months, vec![(2025, 11), (2025, 12), (2026, 1)]);
    }

    #[test]
    fn test_months_before_same_month_is_empty() {
        assert!(months_before(d(2026, 2, 1), d(2026, 2, 28)).is_empty());
    }

    #[test]
    fn test_fixed_clock_today() {
        let clock = FixedClock::at_date(d(2026, 5, 17));
        assert_eq!(clock.today(), d(2026, 5, 17));
    }
}
