use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::granularity::Granularity;

/// A point in the issue order of one block: the appearance date plus the
/// position of the issue in the block's issue list. Points compare first by
/// date, then by issue position, which is the order in which stampings of one
/// day are counted.
pub type IssuePoint = (NaiveDate, usize);

/// Auto-counting metadata attached to a block, e.g. a running issue number.
///
/// A counter starts at a creation point and counts until it is replaced by
/// another counter of the same type (its deletion point) or runs out at the
/// end of the block. Counters exist so that auto-incrementing fields survive
/// the XML round trip; evaluating counter values is up to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountableMetadata {
    create: IssuePoint,
    delete: Option<IssuePoint>,
    metadata_type: String,
    start_value: String,
    step_size: Option<Granularity>,
}

impl CountableMetadata {
    pub fn new(metadata_type: impl Into<String>, create: IssuePoint) -> CountableMetadata {
        CountableMetadata {
            create,
            delete: None,
            metadata_type: metadata_type.into(),
            start_value: String::new(),
            step_size: None,
        }
    }

    /// The date and issue position this counter appears the first time.
    pub fn create(&self) -> IssuePoint {
        self.create
    }

    /// The date and issue position this counter no longer appears on, if a
    /// replacement has been recorded.
    pub fn delete(&self) -> Option<IssuePoint> {
        self.delete
    }

    pub fn set_delete(&mut self, delete: Option<IssuePoint>) {
        self.delete = delete;
    }

    /// The metadata type key this counter writes to.
    pub fn metadata_type(&self) -> &str {
        &self.metadata_type
    }

    /// The value the counter starts counting with. An empty start value
    /// disables the counter.
    pub fn start_value(&self) -> &str {
        &self.start_value
    }

    pub fn set_start_value(&mut self, start_value: impl Into<String>) {
        self.start_value = start_value.into();
    }

    /// When the counter is incremented, if at all.
    pub fn step_size(&self) -> Option<Granularity> {
        self.step_size
    }

    pub fn set_step_size(&mut self, step_size: Option<Granularity>) {
        self.step_size = step_size;
    }

    /// Rewrites the issue positions after an issue has been removed from the
    /// owning block. Returns `false` when the counter was created at the
    /// removed issue and must be dropped; a deletion point at the removed
    /// issue degrades to an open end.
    pub(crate) fn adjust_issue_removed(&mut self, removed: usize) -> bool {
        if self.create.1 == removed {
            return false;
        }
        if self.create.1 > removed {
            self.create.1 -= 1;
        }
        match self.delete {
            Some((_, issue)) if issue == removed => self.delete = None,
            Some((date, issue)) if issue > removed => self.delete = Some((date, issue - 1)),
            _ => {}
        }
        true
    }

    /// Whether this counter concerns the given metadata type (`None` matches
    /// any type) and point in time. `created` selects the comparison:
    /// `Some(true)` the creation point, `Some(false)` the deletion point,
    /// `None` the active range [create, delete).
    pub fn matches(
        &self,
        metadata_type: Option<&str>,
        point: IssuePoint,
        created: Option<bool>,
    ) -> bool {
        if metadata_type.is_some_and(|key| key != self.metadata_type) {
            return false;
        }
        match created {
            Some(true) => self.create == point,
            Some(false) => self.delete == Some(point),
            None => self.create <= point && self.delete.is_none_or(|delete| point < delete),
        }
    }
}
