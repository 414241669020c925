//! Export of a course of appearance to its XML representation.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use gazette_model::{CountableMetadata, Course, IndividualIssue, YearStart};

use crate::description;
use crate::error::Result;

/// Writes the course to the given writer as an XML document. The document is
/// built from the course's current process groups; call
/// [`Course::split_into`] first if they have not been derived yet.
pub fn write_course<W: Write>(course: &Course, writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("course");
    let year_begin = course.year_start().to_string();
    if course.year_start() != YearStart::JANUARY_1 {
        root.push_attribute(("yearBegin", year_begin.as_str()));
    }
    if !course.year_name().is_empty() {
        root.push_attribute(("yearTerm", course.year_name()));
    }
    xml.write_event(Event::Start(root))?;

    let description = description::as_readable_text(course).join("\n\n");
    xml.write_event(Event::Start(BytesStart::new("description")))?;
    xml.write_event(Event::Text(BytesText::new(&description)))?;
    xml.write_event(Event::End(BytesEnd::new("description")))?;

    xml.write_event(Event::Start(BytesStart::new("processes")))?;
    let mut after_declarations: HashSet<(usize, String)> = HashSet::new();
    for process in course.processes() {
        xml.write_event(Event::Start(BytesStart::new("process")))?;
        let mut open_block: Option<usize> = None;
        for issue in process {
            if open_block != Some(issue.block_index()) {
                if open_block.is_some() {
                    xml.write_event(Event::End(BytesEnd::new("title")))?;
                }
                let mut title = BytesStart::new("title");
                let index = (issue.block_index() + 1).to_string();
                title.push_attribute(("index", index.as_str()));
                xml.write_event(Event::Start(title))?;
                open_block = Some(issue.block_index());
            }
            write_appeared(&mut xml, course, &mut after_declarations, issue)?;
        }
        if open_block.is_some() {
            xml.write_event(Event::End(BytesEnd::new("title")))?;
        }
        xml.write_event(Event::End(BytesEnd::new("process")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("processes")))?;

    xml.write_event(Event::End(BytesEnd::new("course")))?;
    Ok(())
}

/// Renders the course to an XML string.
pub fn course_to_xml_string(course: &Course) -> Result<String> {
    let mut buffer = Vec::new();
    write_course(course, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_appeared<W: Write>(
    xml: &mut Writer<W>,
    course: &Course,
    after_declarations: &mut HashSet<(usize, String)>,
    issue: &IndividualIssue,
) -> Result<()> {
    // the after declaration goes out once per block and heading, the first
    // time the pair comes by
    let declaration = (issue.block_index(), issue.heading().to_owned());
    let after = if after_declarations.insert(declaration) {
        let issues_before = issue.issues_before(course);
        (!issues_before.is_empty()).then(|| join_quoting(&issues_before))
    } else {
        None
    };

    let mut appeared = BytesStart::new("appeared");
    if !issue.heading().trim().is_empty() {
        appeared.push_attribute(("issue", issue.heading()));
    }
    let date = issue.date().to_string();
    appeared.push_attribute(("date", date.as_str()));
    if let Some(after) = &after {
        appeared.push_attribute(("after", after.as_str()));
    }

    let metadata = metadata_at(course, issue);
    if metadata.is_empty() {
        xml.write_event(Event::Empty(appeared))?;
        return Ok(());
    }
    xml.write_event(Event::Start(appeared))?;
    let point = (issue.date(), issue.issue_index());
    for (metadata_type, counter) in metadata {
        let mut node = BytesStart::new("metadata");
        node.push_attribute(("metadataType", metadata_type));
        if counter.matches(Some(metadata_type), point, Some(false)) {
            // the counter ends here, an empty value disables it
            node.push_attribute(("value", ""));
        } else {
            node.push_attribute(("value", counter.start_value()));
            if let Some(step_size) = counter.step_size() {
                node.push_attribute(("increment", step_size.as_str()));
            }
        }
        xml.write_event(Event::Empty(node))?;
    }
    xml.write_event(Event::End(BytesEnd::new("appeared")))?;
    Ok(())
}

/// The counters to mention at a stamping: those deleted there, overridden by
/// those created there, keyed by metadata type.
fn metadata_at<'c>(
    course: &'c Course,
    issue: &IndividualIssue,
) -> BTreeMap<&'c str, &'c CountableMetadata> {
    let mut result = BTreeMap::new();
    let Some(block) = course.blocks().get(issue.block_index()) else {
        return result;
    };
    let point = (issue.date(), issue.issue_index());
    for counter in block.metadata_matching(point, Some(false)) {
        result.insert(counter.metadata_type(), counter);
    }
    for counter in block.metadata_matching(point, Some(true)) {
        result.insert(counter.metadata_type(), counter);
    }
    result
}

/// Joins tokens with spaces, surrounding tokens containing spaces with
/// double quotes and doubling embedded quotes as `''`.
fn join_quoting(input: &[String]) -> String {
    let mut result = String::with_capacity(16 * input.len());
    for (position, item) in input.iter().enumerate() {
        if position > 0 {
            result.push(' ');
        }
        let has_space = item.contains(' ');
        if has_space {
            result.push('"');
        }
        result.push_str(&item.replace('"', "''"));
        if has_space {
            result.push('"');
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::join_quoting;

    #[test]
    fn quotes_tokens_containing_spaces() {
        let tokens = vec![
            "Morning".to_owned(),
            "Evening Edition".to_owned(),
            "The \"Daily\" News".to_owned(),
        ];
        assert_eq!(
            join_quoting(&tokens),
            "Morning \"Evening Edition\" \"The ''Daily'' News\""
        );
    }
}
