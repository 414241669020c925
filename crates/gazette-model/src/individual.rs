use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::course::Course;
use crate::granularity::{BreakMark, Granularity};
use crate::issue::Issue;
use crate::year::YearStart;

/// A stamping of an [`Issue`]: one distinguishable physically appeared issue.
/// In opposition, `Issue` represents the *type* of issue.
///
/// Individual issues are derived from the course state; they address their
/// block and issue by position and snapshot the heading at derivation time.
/// The sorting number disambiguates several same-day stampings of the same
/// heading and is the only mutable part.
///
/// Equality and hashing cover the date, the issue identity, and the block
/// position, but not the sorting number: two same-day stampings of one issue
/// compare equal as values despite distinct sorting numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndividualIssue {
    block: usize,
    issue: usize,
    issue_id: Uuid,
    heading: String,
    date: NaiveDate,
    sorting_number: Option<u32>,
}

impl IndividualIssue {
    pub(crate) fn new(
        block: usize,
        issue_index: usize,
        issue: &Issue,
        date: NaiveDate,
        sorting_number: Option<u32>,
    ) -> IndividualIssue {
        IndividualIssue {
            block,
            issue: issue_index,
            issue_id: issue.id(),
            heading: issue.heading().to_owned(),
            date,
            sorting_number,
        }
    }

    /// Position of the owning block in the course.
    pub fn block_index(&self) -> usize {
        self.block
    }

    /// Position of the issue in the owning block's issue list.
    pub fn issue_index(&self) -> usize {
        self.issue
    }

    /// Identity of the issue this is a stamping of.
    pub fn issue_id(&self) -> Uuid {
        self.issue_id
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sorting_number(&self) -> Option<u32> {
        self.sorting_number
    }

    pub fn set_sorting_number(&mut self, sorting_number: Option<u32>) {
        self.sorting_number = sorting_number;
    }

    /// The equality key which, for a given granularity, indicates for two
    /// neighboring individual issues whether they form the same process
    /// (equal marks) or two different processes (differing marks).
    pub fn break_mark(&self, mode: Granularity, year_start: YearStart) -> BreakMark {
        match mode {
            Granularity::Issues => BreakMark::Issue {
                date: self.date,
                block: self.block,
                issue: self.issue,
            },
            Granularity::Days => BreakMark::Day(self.date),
            Granularity::Weeks => BreakMark::Week {
                year: year_start.fiscal_year(self.date),
                week: self.date.iso_week().week(),
            },
            Granularity::Months => BreakMark::Month {
                year: year_start.fiscal_year(self.date),
                month: self.date.month(),
            },
            Granularity::Quarters => BreakMark::Quarter {
                year: year_start.fiscal_year(self.date),
                quarter: (self.date.month() - 1) / 3,
            },
            Granularity::Years => BreakMark::Year(year_start.fiscal_year(self.date)),
        }
    }

    /// Headings of the issues ordered before this one in its block's issue
    /// list. The walk stops at the first issue carrying this stamping's own
    /// heading.
    pub fn issues_before(&self, course: &Course) -> Vec<String> {
        let Some(block) = course.blocks().get(self.block) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for issue in block.issues() {
            if issue.heading() == self.heading {
                break;
            }
            result.push(issue.heading().to_owned());
        }
        result
    }

    /// Generic fields for process title templating: `#DAY`, `#MONTH`,
    /// `#YEAR`, `#YR` (two-digit year), `#Issue` (the full heading), and the
    /// abbreviated heading fields `#i`/`#I` through `#issu`/`#ISSU` (first
    /// one to four letters, lower/upper case).
    pub fn generic_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        let upper = self.heading.to_uppercase();
        let lower = self.heading.to_lowercase();
        for (length, lower_key, upper_key) in [
            (1, "#i", "#I"),
            (2, "#is", "#IS"),
            (3, "#iss", "#ISS"),
            (4, "#issu", "#ISSU"),
        ] {
            fields.insert(lower_key.to_owned(), lower.chars().take(length).collect());
            fields.insert(upper_key.to_owned(), upper.chars().take(length).collect());
        }
        fields.insert("#Issue".to_owned(), self.heading.clone());
        fields.insert("#DAY".to_owned(), format!("{:02}", self.date.day()));
        fields.insert("#MONTH".to_owned(), format!("{:02}", self.date.month()));
        fields.insert("#YEAR".to_owned(), format!("{:04}", self.date.year()));
        fields.insert(
            "#YR".to_owned(),
            format!("{:02}", self.date.year().rem_euclid(100)),
        );
        fields
    }
}

impl PartialEq for IndividualIssue {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.issue_id == other.issue_id && self.block == other.block
    }
}

impl Eq for IndividualIssue {}

impl Hash for IndividualIssue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.date.hash(state);
        self.issue_id.hash(state);
        self.block.hash(state);
    }
}

impl fmt::Display for IndividualIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.heading.is_empty() {
            write!(f, "{}", self.date)
        } else {
            write!(f, "{}, {}", self.date, self.heading)
        }
    }
}
