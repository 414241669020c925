//! Import of a course of appearance from its XML representation.
//!
//! The importer builds the course through [`Course::add_addition`], one
//! `<appeared>` element at a time, and keeps the process grouping recorded in
//! the document as the course's prefilled process cache. Cache invalidation
//! is suspended for the duration of the build and re-armed after a single
//! regularity recalculation pass.
//!
//! `<metadata>` children are collected as deferred records during the
//! document walk and resolved in a second pass once every block and issue
//! exists, validated against the caller's [`FieldResolver`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use gazette_model::{CountableMetadata, Course, Granularity, IndividualIssue, YearStart};

use crate::error::{CourseXmlError, Result};
use crate::resolver::FieldResolver;

/// Reads a course of appearance from an XML string.
pub fn read_course_str(xml: &str, fields: &dyn FieldResolver) -> Result<Course> {
    let mut reader = Reader::from_str(xml);
    let mut state = CourseReader::new(fields);
    loop {
        match reader.read_event()? {
            Event::Start(e) => state.handle_start(&e, false)?,
            Event::Empty(e) => state.handle_start(&e, true)?,
            Event::End(e) => state.handle_end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }
    state.finish()
}

/// Reads a course of appearance from an XML file.
pub fn read_course_file(path: impl AsRef<Path>, fields: &dyn FieldResolver) -> Result<Course> {
    let xml = fs::read_to_string(path)?;
    read_course_str(&xml, fields)
}

/// A `<metadata>` entry read during the document walk, resolved against the
/// course once all blocks and issues exist.
struct RecoveredMetadata {
    date: NaiveDate,
    issue: String,
    metadata_type: String,
    value: String,
    step_size: Option<Granularity>,
}

struct CourseReader<'f> {
    course: Course,
    fields: &'f dyn FieldResolver,
    saw_course: bool,
    saw_processes: bool,
    processes: Vec<Vec<IndividualIssue>>,
    current_process: Option<Vec<IndividualIssue>>,
    current_variant: Option<String>,
    in_title: bool,
    current_appeared: Option<(NaiveDate, String)>,
    /// Position (process, offset) of the latest stamping per date, used to
    /// hand out increasing sorting numbers to same-day repeats. A process
    /// index equal to `processes.len()` addresses the process being built.
    last_issue_for_date: HashMap<NaiveDate, (usize, usize)>,
    recovered: Vec<RecoveredMetadata>,
}

impl<'f> CourseReader<'f> {
    fn new(fields: &'f dyn FieldResolver) -> CourseReader<'f> {
        let mut course = Course::new();
        course.set_processes_volatile(false);
        CourseReader {
            course,
            fields,
            saw_course: false,
            saw_processes: false,
            processes: Vec::new(),
            current_process: None,
            current_variant: None,
            in_title: false,
            current_appeared: None,
            last_issue_for_date: HashMap::new(),
            recovered: Vec::new(),
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        match e.name().as_ref() {
            b"course" => self.handle_course(e)?,
            b"processes" => self.saw_processes = true,
            b"process" => {
                if empty {
                    self.processes.push(Vec::new());
                } else {
                    self.current_process = Some(Vec::new());
                }
            }
            b"title" => {
                if !empty {
                    self.current_variant = attr_value(e, "index")?;
                    self.in_title = true;
                }
            }
            b"appeared" => {
                let context = self.handle_appeared(e)?;
                if !empty {
                    self.current_appeared = Some(context);
                }
            }
            b"metadata" => self.handle_metadata(e)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_end(&mut self, name: &[u8]) {
        match name {
            b"process" => {
                let process = self.current_process.take().unwrap_or_default();
                self.processes.push(process);
            }
            b"title" => {
                self.current_variant = None;
                self.in_title = false;
            }
            b"appeared" => self.current_appeared = None,
            _ => {}
        }
    }

    fn handle_course(&mut self, e: &BytesStart<'_>) -> Result<()> {
        self.saw_course = true;
        if let Some(year_begin) = attr_value(e, "yearBegin")? {
            let year_start = year_begin
                .parse::<YearStart>()
                .map_err(|_| CourseXmlError::InvalidYearBegin { value: year_begin })?;
            self.course.set_year_start(year_start);
        }
        if let Some(year_term) = attr_value(e, "yearTerm")? {
            self.course.set_year_name(year_term);
        }
        Ok(())
    }

    fn handle_appeared(&mut self, e: &BytesStart<'_>) -> Result<(NaiveDate, String)> {
        let heading = attr_value(e, "issue")?.unwrap_or_default();
        let date_text =
            attr_value(e, "date")?.ok_or(CourseXmlError::MissingAttribute {
                element: "appeared",
                attribute: "date",
            })?;
        let date: NaiveDate = date_text
            .parse()
            .map_err(|source| CourseXmlError::InvalidDate {
                value: date_text,
                source,
            })?;
        let before = match attr_value(e, "after")? {
            Some(after) => split_at_spaces(&after),
            None => Vec::new(),
        };
        if !self.in_title || self.current_process.is_none() {
            return Ok((date, heading));
        }
        let mut individual =
            self.course
                .add_addition(self.current_variant.as_deref(), &before, &heading, date)?;
        if let Some(&(process_index, position)) = self.last_issue_for_date.get(&date) {
            let previous = if process_index == self.processes.len() {
                self.current_process
                    .as_mut()
                    .and_then(|process| process.get_mut(position))
            } else {
                self.processes
                    .get_mut(process_index)
                    .and_then(|process| process.get_mut(position))
            };
            if let Some(previous) = previous {
                let number = match previous.sorting_number() {
                    Some(number) => number,
                    None => {
                        previous.set_sorting_number(Some(1));
                        1
                    }
                };
                individual.set_sorting_number(Some(number + 1));
            }
        }
        if let Some(process) = self.current_process.as_mut() {
            process.push(individual);
            self.last_issue_for_date
                .insert(date, (self.processes.len(), process.len() - 1));
        }
        Ok((date, heading))
    }

    fn handle_metadata(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let Some((date, issue)) = self.current_appeared.clone() else {
            return Ok(());
        };
        let metadata_type =
            attr_value(e, "metadataType")?.ok_or(CourseXmlError::MissingAttribute {
                element: "metadata",
                attribute: "metadataType",
            })?;
        let value = attr_value(e, "value")?.ok_or(CourseXmlError::MissingAttribute {
            element: "metadata",
            attribute: "value",
        })?;
        let step_size =
            attr_value(e, "increment")?.and_then(|token| token.parse::<Granularity>().ok());
        self.recovered.push(RecoveredMetadata {
            date,
            issue,
            metadata_type,
            value,
            step_size,
        });
        Ok(())
    }

    fn finish(mut self) -> Result<Course> {
        if !self.saw_course {
            return Err(CourseXmlError::MissingElement("course"));
        }
        if !self.saw_processes {
            return Err(CourseXmlError::MissingElement("processes"));
        }
        self.resolve_recovered_metadata()?;
        for process in std::mem::take(&mut self.processes) {
            self.course.push_process(process);
        }
        self.course.recalculate_regularity_of_issues();
        self.course.set_processes_volatile(true);
        tracing::debug!(
            blocks = self.course.len(),
            processes = self.course.number_of_processes(),
            "read course of appearance"
        );
        Ok(self.course)
    }

    /// Resolves the deferred `<metadata>` records: each one closes the
    /// previous counter of its type on its block and opens a new one at its
    /// own (date, issue) point. Records whose appearance cannot be located
    /// are dropped; unknown metadata keys abort the import.
    fn resolve_recovered_metadata(&mut self) -> Result<()> {
        let mut pending: Vec<(usize, CountableMetadata)> = Vec::new();
        let mut last: HashMap<(usize, String), usize> = HashMap::new();
        for metadata in &self.recovered {
            if !self.fields.is_known(&metadata.metadata_type) {
                return Err(CourseXmlError::UnknownMetadataKey(
                    metadata.metadata_type.clone(),
                ));
            }
            let mut found: Option<(usize, usize)> = None;
            'blocks: for (block_index, block) in self.course.blocks().iter().enumerate() {
                for individual in block.individual_issues(block_index, metadata.date) {
                    if individual.heading() == metadata.issue {
                        found = Some((block_index, individual.issue_index()));
                        break 'blocks;
                    }
                }
            }
            let Some((block_index, issue_index)) = found else {
                continue;
            };
            if let Some(&previous) = last.get(&(block_index, metadata.metadata_type.clone())) {
                pending[previous]
                    .1
                    .set_delete(Some((metadata.date, issue_index)));
            }
            let mut counter = CountableMetadata::new(
                metadata.metadata_type.clone(),
                (metadata.date, issue_index),
            );
            counter.set_start_value(metadata.value.clone());
            counter.set_step_size(metadata.step_size);
            pending.push((block_index, counter));
            last.insert(
                (block_index, metadata.metadata_type.clone()),
                pending.len() - 1,
            );
        }
        for (block_index, counter) in pending {
            self.course.add_metadata(block_index, counter);
        }
        Ok(())
    }
}

fn attr_value(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Splits a string of whitespace-separated tokens, treating tokens
/// surrounded by double quotes as one and undoing the `''` quote doubling.
fn split_at_spaces(input: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                token.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        result.push(token.replace("''", "\""));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::split_at_spaces;

    #[test]
    fn splits_plain_and_quoted_tokens() {
        assert_eq!(
            split_at_spaces("Morning \"Evening Edition\" Extra"),
            vec!["Morning", "Evening Edition", "Extra"]
        );
        assert_eq!(
            split_at_spaces("\"The ''Daily'' News\""),
            vec!["The \"Daily\" News"]
        );
        assert!(split_at_spaces("  ").is_empty());
    }
}
