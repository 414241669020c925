use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Partition strategy used to group individual issues into process groups,
/// mirroring how a physical newspaper archive is organized into scan batches.
///
/// The lower-case names double as the token set of the `increment` attribute
/// in the XML representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Every individual issue becomes its own process.
    Issues,
    /// All issues of one day form one process.
    Days,
    /// All issues of one ISO week form one process.
    Weeks,
    /// All issues of one month form one process.
    Months,
    /// All issues of one quarter form one process.
    Quarters,
    /// All issues of one (possibly non-calendar) year form one process.
    Years,
}

impl Granularity {
    /// The canonical lower-case token, as used in XML.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Granularity::Issues => "issues",
            Granularity::Days => "days",
            Granularity::Weeks => "weeks",
            Granularity::Months => "months",
            Granularity::Quarters => "quarters",
            Granularity::Years => "years",
        }
    }

    /// All granularities, coarsest last.
    pub const fn all() -> &'static [Granularity] {
        &[
            Granularity::Issues,
            Granularity::Days,
            Granularity::Weeks,
            Granularity::Months,
            Granularity::Quarters,
            Granularity::Years,
        ]
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "issues" => Ok(Granularity::Issues),
            "days" => Ok(Granularity::Days),
            "weeks" => Ok(Granularity::Weeks),
            "months" => Ok(Granularity::Months),
            "quarters" => Ok(Granularity::Quarters),
            "years" => Ok(Granularity::Years),
            _ => Err(format!("Unknown granularity: {s}")),
        }
    }
}

/// Equality key deciding whether two neighboring individual issues fall into
/// the same process group.
///
/// `Issue` marks carry the full (date, block, issue) coordinates, so two
/// distinct stampings of a derivation walk never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakMark {
    Issue {
        date: NaiveDate,
        block: usize,
        issue: usize,
    },
    Day(NaiveDate),
    Week {
        year: i32,
        week: u32,
    },
    Month {
        year: i32,
        month: u32,
    },
    Quarter {
        year: i32,
        quarter: u32,
    },
    Year(i32),
}
