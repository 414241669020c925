use gazette_model::CourseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourseXmlError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed XML escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    #[error("missing mandatory attribute {attribute} on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("cannot parse date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot parse year begin {value:?}")]
    InvalidYearBegin { value: String },

    #[error("unknown metadata key {0:?}")]
    UnknownMetadataKey(String),

    #[error(transparent)]
    Course(#[from] CourseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("generated XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, CourseXmlError>;
