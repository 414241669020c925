use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The regular appearance pattern of one (or the) issue of a newspaper.
///
/// Newspapers, especially bigger ones, can have several issues that may
/// differ in time of publication (morning issue, evening issue), geographic
/// distribution, or their days of appearance (weekday issue Mon-Fri, weekend
/// issue Sat). An issue is a weekly pattern plus date-level exceptions in
/// both directions: additions (appeared although the weekday says no, e.g. a
/// special edition) and exclusions (did not appear although the weekday says
/// yes, e.g. a holiday).
///
/// Days of week use ISO numbering, 1 = Monday through 7 = Sunday.
///
/// An issue carries a synthetic id assigned at construction. A plain `clone`
/// keeps the id; [`Issue::duplicate`] copies the data under a fresh id, so a
/// duplicate never compares equal to its source even when every visible field
/// matches. Equality and hashing include the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    id: Uuid,
    heading: String,
    days_of_week: BTreeSet<u32>,
    additions: BTreeSet<NaiveDate>,
    exclusions: BTreeSet<NaiveDate>,
}

impl Issue {
    pub fn new(heading: impl Into<String>) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            heading: heading.into(),
            days_of_week: BTreeSet::new(),
            additions: BTreeSet::new(),
            exclusions: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    /// Replaces the heading. Returns whether the heading changed.
    pub fn set_heading(&mut self, heading: impl Into<String>) -> bool {
        let heading = heading.into();
        if self.heading == heading {
            return false;
        }
        self.heading = heading;
        true
    }

    /// Days of week of regular appearance, ISO-numbered 1..=7.
    pub fn days_of_week(&self) -> &BTreeSet<u32> {
        &self.days_of_week
    }

    /// Whether the issue regularly appears on the ISO-numbered day of week.
    pub fn is_day_of_week(&self, day_of_week: u32) -> bool {
        self.days_of_week.contains(&day_of_week)
    }

    /// Whether the issue regularly appears on the given weekday.
    pub fn appears_on(&self, weekday: Weekday) -> bool {
        self.days_of_week.contains(&weekday.number_from_monday())
    }

    /// Marks a weekday as regular or irregular. Returns whether the pattern
    /// changed.
    pub fn set_day_of_week(&mut self, weekday: Weekday, regular: bool) -> bool {
        let number = weekday.number_from_monday();
        if regular {
            self.days_of_week.insert(number)
        } else {
            self.days_of_week.remove(&number)
        }
    }

    /// Dates with an issue on days of week without regular appearance.
    pub fn additions(&self) -> &BTreeSet<NaiveDate> {
        &self.additions
    }

    /// Dates without an issue on days of regular appearance (i.e. holidays).
    pub fn exclusions(&self) -> &BTreeSet<NaiveDate> {
        &self.exclusions
    }

    pub fn add_addition(&mut self, addition: NaiveDate) -> bool {
        self.additions.insert(addition)
    }

    pub fn remove_addition(&mut self, addition: NaiveDate) -> bool {
        self.additions.remove(&addition)
    }

    pub fn add_exclusion(&mut self, exclusion: NaiveDate) -> bool {
        self.exclusions.insert(exclusion)
    }

    pub fn remove_exclusion(&mut self, exclusion: NaiveDate) -> bool {
        self.exclusions.remove(&exclusion)
    }

    /// Whether the issue appeared on the given date, taking into account the
    /// weekly pattern, the exclusions, and the additions.
    pub fn is_match(&self, date: NaiveDate) -> bool {
        self.days_of_week.contains(&date.weekday().number_from_monday())
            && !self.exclusions.contains(&date)
            || self.additions.contains(&date)
    }

    /// Counts how many stampings of this issue physically appeared in the
    /// inclusive date range without materializing them.
    pub fn count_individual_issues(&self, first_appearance: NaiveDate, last_appearance: NaiveDate) -> u64 {
        first_appearance
            .iter_days()
            .take_while(|day| *day <= last_appearance)
            .filter(|day| self.is_match(*day))
            .count() as u64
    }

    /// Re-derives the weekly pattern from the appearances within the given
    /// inclusive range. A weekday becomes regular iff it has strictly more
    /// matching than non-matching dates; ties resolve to irregular. Dates
    /// violating the new classification replace the previous additions and
    /// exclusions.
    ///
    /// This is especially sensible to detect the underlying regularity after
    /// lots of issues whose existence is known have been recorded one by one
    /// as additions.
    pub fn recalculate_regularity(
        &mut self,
        first_appearance: NaiveDate,
        last_appearance: NaiveDate,
    ) {
        let mut appeared: [Vec<NaiveDate>; 7] = std::array::from_fn(|_| Vec::new());
        let mut missed: [Vec<NaiveDate>; 7] = std::array::from_fn(|_| Vec::new());

        for day in first_appearance
            .iter_days()
            .take_while(|day| *day <= last_appearance)
        {
            let slot = (day.weekday().number_from_monday() - 1) as usize;
            if self.is_match(day) {
                appeared[slot].push(day);
            } else {
                missed[slot].push(day);
            }
        }

        let mut remaining_additions = BTreeSet::new();
        let mut remaining_exclusions = BTreeSet::new();
        for day_of_week in 1..=7u32 {
            let slot = (day_of_week - 1) as usize;
            if appeared[slot].len() > missed[slot].len() {
                self.days_of_week.insert(day_of_week);
                remaining_exclusions.extend(missed[slot].iter().copied());
            } else {
                self.days_of_week.remove(&day_of_week);
                remaining_additions.extend(appeared[slot].iter().copied());
            }
        }

        self.additions = remaining_additions;
        self.exclusions = remaining_exclusions;
    }

    /// Copies the issue under a fresh id. The duplicate carries the same
    /// heading, pattern, and exceptions but a distinct identity, so it never
    /// compares equal to its source.
    pub fn duplicate(&self) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            heading: self.heading.clone(),
            days_of_week: self.days_of_week.clone(),
            additions: self.additions.clone(),
            exclusions: self.exclusions.clone(),
        }
    }
}

impl fmt::Display for Issue {
    /// Concise one-line form, e.g. `Morning issue (M-W-F--) +[] -[2024-01-01]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.heading)?;
        for (day_of_week, letter) in (1..=7u32).zip(['M', 'T', 'W', 'T', 'F', 'S', 'S']) {
            let shown = if self.days_of_week.contains(&day_of_week) {
                letter
            } else {
                '-'
            };
            write!(f, "{shown}")?;
        }
        write!(f, ") +")?;
        format_date_set(f, &self.additions)?;
        write!(f, " -")?;
        format_date_set(f, &self.exclusions)
    }
}

fn format_date_set(f: &mut fmt::Formatter<'_>, dates: &BTreeSet<NaiveDate>) -> fmt::Result {
    if dates.len() > 5 {
        return write!(f, "[…({})…]", dates.len());
    }
    write!(f, "[")?;
    for (position, date) in dates.iter().enumerate() {
        if position > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{date}")?;
    }
    write!(f, "]")
}
