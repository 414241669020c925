//! XML interchange for courses of appearance.
//!
//! The format is a `<course>` root carrying an output-only `<description>`
//! and a `<processes>` tree: one `<process>` per scan batch, `<title>`
//! elements for contiguous block runs, and one `<appeared>` element per
//! physically appeared issue, with optional `<metadata>` counter children.

pub mod description;
pub mod error;
pub mod read;
pub mod resolver;
pub mod write;

pub use error::{CourseXmlError, Result};
pub use read::{read_course_file, read_course_str};
pub use resolver::{AcceptAllFields, FieldResolver};
pub use write::{course_to_xml_string, write_course};
