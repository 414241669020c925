use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::individual::IndividualIssue;
use crate::issue::Issue;
use crate::metadata::{CountableMetadata, IssuePoint};

/// An interval of time in the course of appearance of a newspaper within
/// which it wasn't suspended. A block owns one or more [`Issue`]s and the
/// counter metadata recovered for them.
///
/// The optional variant identifier distinguishes blocks during the buildup of
/// a course from individual issues. Given a newspaper that appeared three
/// times a week for a period and then changed to six times a week without
/// changing its heading, representing the change as two blocks keeps the
/// exception sets small, and the variant tells the two apart.
///
/// Both bounds are inclusive and travel together: once either is set, the
/// other is initialized to the same date. Bound mutation goes through the
/// owning [`Course`](crate::course::Course), which enforces that sibling
/// blocks never overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    variant: Option<String>,
    first_appearance: Option<NaiveDate>,
    last_appearance: Option<NaiveDate>,
    issues: Vec<Issue>,
    metadata: Vec<CountableMetadata>,
}

impl Block {
    pub fn new(variant: Option<String>) -> Block {
        Block {
            variant,
            first_appearance: None,
            last_appearance: None,
            issues: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// First day of the period of time represented by this block, inclusive.
    pub fn first_appearance(&self) -> Option<NaiveDate> {
        self.first_appearance
    }

    /// Last day of the period of time represented by this block, inclusive.
    pub fn last_appearance(&self) -> Option<NaiveDate> {
        self.last_appearance
    }

    pub(crate) fn set_first_appearance_raw(&mut self, first_appearance: Option<NaiveDate>) {
        self.first_appearance = first_appearance;
    }

    pub(crate) fn set_last_appearance_raw(&mut self, last_appearance: Option<NaiveDate>) {
        self.last_appearance = last_appearance;
    }

    /// The issues that appeared during the period of this block, in
    /// presentation order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub(crate) fn issue_mut(&mut self, index: usize) -> &mut Issue {
        &mut self.issues[index]
    }

    /// Appends an issue and returns its position. On blocks already owned by
    /// a course, use the course-level methods instead so the derived process
    /// cache stays consistent.
    pub fn push_issue(&mut self, issue: Issue) -> usize {
        self.issues.push(issue);
        self.issues.len() - 1
    }

    pub(crate) fn remove_issue_raw(&mut self, index: usize) -> Issue {
        let removed = self.issues.remove(index);
        self.metadata
            .retain_mut(|metadata| metadata.adjust_issue_removed(index));
        removed
    }

    /// Position of the first issue with the given heading.
    pub fn issue_index_by_heading(&self, heading: &str) -> Option<usize> {
        self.issues
            .iter()
            .position(|issue| issue.heading() == heading)
    }

    /// Whether two issues of this block share a heading.
    pub fn has_duplicate_headings(&self) -> bool {
        let mut seen = Vec::with_capacity(self.issues.len());
        for issue in &self.issues {
            if seen.contains(&issue.heading()) {
                return true;
            }
            seen.push(issue.heading());
        }
        false
    }

    /// Whether the block carries no data at all: no bounds, no issues.
    pub fn is_empty(&self) -> bool {
        self.first_appearance.is_none() && self.last_appearance.is_none() && self.issues.is_empty()
    }

    /// Null-safe variant comparison: an unnamed block is identified by `None`
    /// only.
    pub fn is_identified_by(&self, variant: Option<&str>) -> bool {
        self.variant.as_deref() == variant
    }

    /// Whether the date comes within the limits of this block. `false` while
    /// either bound is unset.
    pub fn covers(&self, date: NaiveDate) -> bool {
        match (self.first_appearance, self.last_appearance) {
            (Some(first), Some(last)) => first <= date && date <= last,
            _ => false,
        }
    }

    /// The stampings of one day, one per issue matching the date, in issue
    /// order. With more than one match, sorting numbers 1, 2, 3… are handed
    /// out; a single match carries none.
    pub fn individual_issues(&self, block_index: usize, date: NaiveDate) -> Vec<IndividualIssue> {
        if !self.covers(date) {
            return Vec::new();
        }
        let matching: Vec<usize> = self
            .issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| issue.is_match(date))
            .map(|(index, _)| index)
            .collect();
        let mut sorting = (matching.len() > 1).then_some(1u32);
        matching
            .into_iter()
            .map(|index| {
                let number = sorting;
                if let Some(value) = &mut sorting {
                    *value += 1;
                }
                IndividualIssue::new(block_index, index, &self.issues[index], date, number)
            })
            .collect()
    }

    /// Counts the stampings of issues that physically appeared in this block
    /// without materializing them. Zero while the bounds are unset.
    pub fn count_individual_issues(&self) -> u64 {
        let (Some(first), Some(last)) = (self.first_appearance, self.last_appearance) else {
            return 0;
        };
        self.issues
            .iter()
            .map(|issue| issue.count_individual_issues(first, last))
            .sum()
    }

    /// Whether an issue contributes at least one stamping to this block. When
    /// the bounds cannot be evaluated the answer is `true`, the safe side for
    /// cache invalidation.
    pub(crate) fn issue_contributes(&self, issue: &Issue) -> bool {
        match (self.first_appearance, self.last_appearance) {
            (Some(first), Some(last)) => issue.count_individual_issues(first, last) > 0,
            _ => true,
        }
    }

    /// Re-derives the weekly pattern of every issue from the appearances
    /// within this block's bounds. A no-op while the bounds are unset.
    pub fn recalculate_regularity_of_issues(&mut self) {
        let (Some(first), Some(last)) = (self.first_appearance, self.last_appearance) else {
            return;
        };
        for issue in &mut self.issues {
            issue.recalculate_regularity(first, last);
        }
    }

    /// The counter metadata of this block, most recently added first.
    pub fn metadata(&self) -> &[CountableMetadata] {
        &self.metadata
    }

    pub(crate) fn insert_metadata_front(&mut self, metadata: CountableMetadata) {
        self.metadata.insert(0, metadata);
    }

    pub(crate) fn remove_metadata(&mut self, index: usize) -> CountableMetadata {
        self.metadata.remove(index)
    }

    pub(crate) fn metadata_mut(&mut self, index: usize) -> &mut CountableMetadata {
        &mut self.metadata[index]
    }

    /// The counters concerning the given point: created there (`Some(true)`),
    /// deleted there (`Some(false)`), or active there (`None`).
    pub fn metadata_matching(
        &self,
        point: IssuePoint,
        created: Option<bool>,
    ) -> impl Iterator<Item = &CountableMetadata> {
        self.metadata
            .iter()
            .filter(move |metadata| metadata.matches(None, point, created))
    }

    /// The first counter of the given type concerning the given point.
    pub fn metadata_for(
        &self,
        metadata_type: &str,
        point: IssuePoint,
        created: Option<bool>,
    ) -> Option<&CountableMetadata> {
        self.metadata
            .iter()
            .find(|metadata| metadata.matches(Some(metadata_type), point, created))
    }

    /// Copies the bounds and issues into a fresh unnamed block. The issues
    /// are duplicated under fresh identities; counter metadata is not copied.
    pub fn duplicate(&self) -> Block {
        Block {
            variant: None,
            first_appearance: self.first_appearance,
            last_appearance: self.last_appearance,
            issues: self.issues.iter().map(Issue::duplicate).collect(),
            metadata: Vec::new(),
        }
    }
}

/// Equality covers the variant, the bounds, and the issues; counter metadata
/// is carried along but does not define block identity.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant
            && self.first_appearance == other.first_appearance
            && self.last_appearance == other.last_appearance
            && self.issues == other.issues
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant.hash(state);
        self.first_appearance.hash(state);
        self.last_appearance.hash(state);
        self.issues.hash(state);
    }
}

impl fmt::Display for Block {
    /// Concise one-line form, e.g. `2024-01-01 - 2024-12-31 [Morning (M------) +[] -[]]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.first_appearance {
            write!(f, "{first}")?;
        }
        write!(f, " - ")?;
        if let Some(last) = self.last_appearance {
            write!(f, "{last}")?;
        }
        write!(f, " [")?;
        for (position, issue) in self.issues.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{issue}")?;
        }
        write!(f, "]")
    }
}
