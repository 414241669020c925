//! Human-readable rendering of a course of appearance.
//!
//! The generated paragraphs are embedded as `<description>` in the XML
//! representation so the document can be checked by a person. The text is
//! output only and has no effect on input.

use gazette_model::{Block, Course, Issue};

const WEEKDAY_NAMES: [&str; 7] = [
    "Mondays",
    "Tuesdays",
    "Wednesdays",
    "Thursdays",
    "Fridays",
    "Saturdays",
    "Sundays",
];

/// Renders the course as a list of paragraphs of English prose, one summary
/// paragraph followed by one paragraph per block.
pub fn as_readable_text(course: &Course) -> Vec<String> {
    let mut paragraphs = Vec::new();
    match (course.first_appearance(), course.last_appearance()) {
        (Some(first), Some(last)) => paragraphs.push(format!(
            "The newspaper appeared from {first} to {last} in {} of time, with {} individually appeared issues in total.",
            count_phrase(course.len(), "block"),
            course.count_individual_issues()
        )),
        _ => paragraphs.push("The newspaper has no recorded appearances yet.".to_owned()),
    }
    for block in course.blocks() {
        paragraphs.push(describe_block(block));
    }
    paragraphs
}

fn describe_block(block: &Block) -> String {
    let mut text = String::new();
    match (block.first_appearance(), block.last_appearance()) {
        (Some(first), Some(last)) => text.push_str(&format!("From {first} to {last}: ")),
        _ => text.push_str("In an open period: "),
    }
    if block.issues().is_empty() {
        text.push_str("no issues are recorded.");
        return text;
    }
    let sentences: Vec<String> = block.issues().iter().map(describe_issue).collect();
    text.push_str(&sentences.join(" "));
    text
}

fn describe_issue(issue: &Issue) -> String {
    let name = if issue.heading().is_empty() {
        "The issue".to_owned()
    } else {
        format!("\u{201c}{}\u{201d}", issue.heading())
    };
    let mut sentence = match weekday_phrase(issue) {
        Some(days) => format!("{name} appeared regularly on {days}"),
        None => format!("{name} had no regular days of appearance"),
    };
    if !issue.additions().is_empty() {
        sentence.push_str(&format!(
            ", plus {} recorded individually",
            count_phrase(issue.additions().len(), "date")
        ));
    }
    if !issue.exclusions().is_empty() {
        sentence.push_str(&format!(
            ", except on {}",
            count_phrase(issue.exclusions().len(), "date")
        ));
    }
    sentence.push('.');
    sentence
}

fn weekday_phrase(issue: &Issue) -> Option<String> {
    let names: Vec<&str> = issue
        .days_of_week()
        .iter()
        .filter_map(|day| WEEKDAY_NAMES.get((*day as usize).wrapping_sub(1)).copied())
        .collect();
    match names.as_slice() {
        [] => None,
        [single] => Some((*single).to_owned()),
        [head @ .., tail] => Some(format!("{} and {}", head.join(", "), tail)),
    }
}

fn count_phrase(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("one {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
