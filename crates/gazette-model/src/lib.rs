//! Course-of-appearance calendar model for newspaper digitization.
//!
//! A course of appearance records on which calendar dates each named issue of
//! a newspaper physically appeared, expressed as contiguous time blocks with
//! weekly regularity plus date-level exceptions. From that model the crate
//! derives the flat list of individual issues and partitions it into process
//! groups, one per scan batch, at a chosen granularity.

pub mod block;
pub mod course;
pub mod error;
pub mod granularity;
pub mod individual;
pub mod issue;
pub mod metadata;
pub mod year;

pub use block::Block;
pub use course::{Course, MessageSink, OverlapPolicy};
pub use error::{CourseError, Result};
pub use granularity::{BreakMark, Granularity};
pub use individual::IndividualIssue;
pub use issue::Issue;
pub use metadata::{CountableMetadata, IssuePoint};
pub use year::YearStart;
