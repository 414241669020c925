//! Year-start handling for non-calendar years.
//!
//! Newspapers were sometimes counted in business years, seasons, or school
//! years that begin on a day other than January 1. The year start only
//! affects how individual issues are partitioned at year, quarter, and week
//! boundaries.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// First day of the (possibly non-calendar) year, e.g. July 1 for a fiscal
/// year. Serialized as `--MM-dd` in the XML representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearStart {
    month: u32,
    day: u32,
}

impl YearStart {
    /// January the 1st, the default for calendar years.
    pub const JANUARY_1: YearStart = YearStart { month: 1, day: 1 };

    /// Creates a year start, validating the month/day combination against a
    /// leap year so that `--02-29` is accepted.
    pub fn new(month: u32, day: u32) -> Option<YearStart> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| YearStart { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Anchors the year start onto a concrete year. `--02-29` falls back to
    /// February 28 outside leap years.
    pub fn at_year(&self, year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
            .expect("a valid month/day combination anchors onto every year")
    }

    /// The year range a date belongs to, identified by the calendar year in
    /// which that range begins.
    pub fn fiscal_year(&self, date: NaiveDate) -> i32 {
        let year = date.year();
        if date < self.at_year(year) {
            year - 1
        } else {
            year
        }
    }
}

impl Default for YearStart {
    fn default() -> Self {
        YearStart::JANUARY_1
    }
}

impl fmt::Display for YearStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for YearStart {
    type Err = String;

    /// Parses the `--MM-dd` form used by the XML representation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("--")
            .ok_or_else(|| format!("year start must have the form --MM-dd: {s:?}"))?;
        let (month, day) = rest
            .split_once('-')
            .ok_or_else(|| format!("year start must have the form --MM-dd: {s:?}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in year start: {s:?}"))?;
        let day: u32 = day
            .parse()
            .map_err(|_| format!("invalid day in year start: {s:?}"))?;
        YearStart::new(month, day).ok_or_else(|| format!("no such day in any year: {s:?}"))
    }
}
