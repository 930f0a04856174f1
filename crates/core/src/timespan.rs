use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive date window, used for fetch requests against the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Window a sync run looks back over: at most `maximum_days` before
    /// `today`, but never before `earliest_date`.
    pub fn sync_window(today: NaiveDate, earliest_date: NaiveDate, maximum_days: u32) -> Self {
        let floor = today
            .checked_sub_days(Days::new(u64::from(maximum_days)))
            .unwrap_or(earliest_date);
        DateRange {
            start: floor.max(earliest_date),
            end: today,
        }
    }
}
