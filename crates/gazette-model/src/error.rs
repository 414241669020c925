use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by course mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseError {
    /// The requested publication period intersects the period of a sibling
    /// block. Carries the identity and bounds of the conflicting block.
    #[error("({}) {first} - {last}", .variant.as_deref().unwrap_or(""))]
    Overlap {
        variant: Option<String>,
        first: NaiveDate,
        last: NaiveDate,
    },

    /// An overlap detected while expanding a block to cover a newly added
    /// appearance date.
    #[error("{source}, ({}) {date}", .variant.as_deref().unwrap_or(""))]
    ExpansionOverlap {
        variant: Option<String>,
        date: NaiveDate,
        #[source]
        source: Box<CourseError>,
    },
}

pub type Result<T> = std::result::Result<T, CourseError>;
