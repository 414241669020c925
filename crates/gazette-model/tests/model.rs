//! Tests for the core calendar model types.

use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use gazette_model::{Block, Course, CourseError, Issue};

fn date(iso: &str) -> NaiveDate {
    iso.parse().expect("valid test date")
}

/// One block, 2024-01-01 (a Monday) through 2024-01-14, with a "Morning"
/// issue appearing Mondays, Wednesdays, and Fridays.
fn course_with_morning_block() -> Course {
    let mut course = Course::new();
    let block = course.append_block(None);
    course
        .set_publication_period(block, date("2024-01-01"), date("2024-01-14"))
        .expect("period is free");
    let mut issue = Issue::new("Morning");
    issue.set_day_of_week(Weekday::Mon, true);
    issue.set_day_of_week(Weekday::Wed, true);
    issue.set_day_of_week(Weekday::Fri, true);
    course.push_issue(block, issue);
    course
}

#[test]
fn issue_matches_pattern_with_exceptions() {
    let mut issue = Issue::new("Morning");
    issue.set_day_of_week(Weekday::Mon, true);
    issue.add_exclusion(date("2024-01-08"));
    issue.add_addition(date("2024-01-03"));

    assert!(issue.is_match(date("2024-01-01")), "a regular Monday");
    assert!(!issue.is_match(date("2024-01-08")), "an excluded Monday");
    assert!(issue.is_match(date("2024-01-03")), "an added Wednesday");
    assert!(!issue.is_match(date("2024-01-02")), "an ordinary Tuesday");
}

#[test]
fn addition_edit_clears_process_cache() {
    let mut course = course_with_morning_block();
    course.split_into(gazette_model::Granularity::Weeks);
    assert_eq!(course.number_of_processes(), 2);

    let changed = course.add_issue_addition(0, 0, date("2024-01-06"));
    assert!(changed);
    assert!(course.processes().is_empty(), "cache must never be stale");
}

#[test]
fn adding_an_empty_issue_keeps_the_cache() {
    let mut course = course_with_morning_block();
    course.split_into(gazette_model::Granularity::Weeks);
    assert_eq!(course.number_of_processes(), 2);

    let empty = course.add_issue(0);
    assert_eq!(course.number_of_processes(), 2, "an empty issue contributes nothing");

    course.remove_issue(0, empty);
    assert_eq!(course.number_of_processes(), 2);

    course.remove_issue(0, 0);
    assert!(course.processes().is_empty(), "the contributing issue is gone");
}

#[test]
fn weekday_toggle_clears_cache_only_on_change() {
    let mut course = course_with_morning_block();
    course.split_into(gazette_model::Granularity::Weeks);

    assert!(!course.set_issue_day_of_week(0, 0, Weekday::Mon, true));
    assert_eq!(course.number_of_processes(), 2, "no change, no invalidation");

    assert!(course.set_issue_day_of_week(0, 0, Weekday::Sat, true));
    assert!(course.processes().is_empty());
}

#[test]
fn duplicate_issue_is_never_equal_to_its_source() {
    let mut issue = Issue::new("Morning");
    issue.set_day_of_week(Weekday::Mon, true);
    issue.add_addition(date("2024-01-03"));

    let copy = issue.duplicate();
    assert_eq!(copy.heading(), issue.heading());
    assert_eq!(copy.days_of_week(), issue.days_of_week());
    assert_eq!(copy.additions(), issue.additions());
    assert_ne!(copy, issue, "a duplicate carries a fresh identity");

    let clone = issue.clone();
    assert_eq!(clone, issue, "a plain clone keeps the identity");

    let mut set = HashSet::new();
    set.insert(issue);
    set.insert(copy);
    assert_eq!(set.len(), 2);
}

#[test]
fn same_day_stampings_get_sorting_numbers() {
    let mut course = course_with_morning_block();
    let mut evening = Issue::new("Evening");
    evening.set_day_of_week(Weekday::Mon, true);
    course.push_issue(0, evening);

    let block = &course.blocks()[0];
    let monday = block.individual_issues(0, date("2024-01-01"));
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[0].heading(), "Morning");
    assert_eq!(monday[0].sorting_number(), Some(1));
    assert_eq!(monday[1].heading(), "Evening");
    assert_eq!(monday[1].sorting_number(), Some(2));

    let wednesday = block.individual_issues(0, date("2024-01-03"));
    assert_eq!(wednesday.len(), 1);
    assert_eq!(wednesday[0].sorting_number(), None, "a single match needs no number");

    assert!(block.individual_issues(0, date("2024-02-01")).is_empty());
}

#[test]
fn add_addition_creates_blocks_and_issues_in_order() {
    let mut course = Course::new();
    course
        .add_addition(None, &[], "Evening", date("2024-01-01"))
        .expect("first block is free");
    course
        .add_addition(
            None,
            &["Morning".to_owned()],
            "Noon",
            date("2024-01-03"),
        )
        .expect("expansion is free");

    assert_eq!(course.len(), 1);
    let block = &course.blocks()[0];
    assert_eq!(block.first_appearance(), Some(date("2024-01-01")));
    assert_eq!(block.last_appearance(), Some(date("2024-01-03")));
    let headings: Vec<&str> = block.issues().iter().map(Issue::heading).collect();
    assert_eq!(headings, ["Evening", "Morning", "Noon"]);

    course
        .add_addition(Some("2"), &[], "Evening", date("2024-02-01"))
        .expect("a later block is free");
    assert_eq!(course.len(), 2);
    assert_eq!(course.block_by_variant(Some("2")), Some(1));
    assert_eq!(course.block_by_variant(None), Some(0));
    assert_eq!(course.block_by_variant(Some("9")), None);
}

#[test]
fn expansion_overlap_is_wrapped_with_context() {
    let mut course = Course::new();
    course
        .add_addition(Some("1"), &[], "", date("2024-01-01"))
        .expect("first block is free");
    course
        .add_addition(Some("2"), &[], "", date("2024-01-10"))
        .expect("second block is free");
    course
        .add_addition(Some("2"), &[], "", date("2024-01-12"))
        .expect("expanding the second block is free");

    let result = course.add_addition(Some("1"), &[], "", date("2024-01-11"));
    match result {
        Err(CourseError::ExpansionOverlap { date: failed, .. }) => {
            assert_eq!(failed, date("2024-01-11"));
        }
        other => panic!("expected an expansion overlap, got {other:?}"),
    }
    assert_eq!(course.blocks()[0].first_appearance(), Some(date("2024-01-01")));
    assert_eq!(course.blocks()[0].last_appearance(), Some(date("2024-01-01")));

    let fresh = course.add_addition(Some("3"), &[], "", date("2024-01-11"));
    assert!(fresh.is_err());
    assert_eq!(course.len(), 2, "the failed block is not left behind");
}

#[test]
fn variant_lookup_survives_block_removal() {
    let mut course = Course::new();
    course.append_block(Some("a".to_owned()));
    course.append_block(Some("b".to_owned()));
    assert_eq!(course.block_by_variant(Some("b")), Some(1));

    course.remove_block(0);
    assert_eq!(course.block_by_variant(Some("b")), Some(0));
    assert_eq!(course.block_by_variant(Some("a")), None);
}

#[test]
fn course_wide_counts_and_lookup() {
    let mut course = course_with_morning_block();
    assert_eq!(course.count_individual_issues(), 6);
    assert_eq!(course.first_appearance(), Some(date("2024-01-01")));
    assert_eq!(course.last_appearance(), Some(date("2024-01-14")));
    assert_eq!(course.block_matching(date("2024-01-05")), Some(0));
    assert_eq!(course.block_matching(date("2024-02-05")), None);

    let issues = course.individual_issues();
    assert_eq!(issues.len(), 6);
    assert!(issues.windows(2).all(|pair| pair[0].date() <= pair[1].date()));

    course.append_block(Some("later".to_owned()));
    assert_eq!(course.count_individual_issues(), 6, "an empty block adds nothing");
}

#[test]
fn guessed_page_total_weights_sundays() {
    let mut course = Course::new();
    let block = course.append_block(None);
    course
        .set_publication_period(block, date("2024-01-01"), date("2024-01-07"))
        .expect("period is free");
    let mut daily = Issue::new("Daily");
    for weekday in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ] {
        daily.set_day_of_week(weekday, true);
    }
    course.push_issue(block, daily);

    assert_eq!(course.guess_total_pages(), 6 * 40 + 240);
}

#[test]
fn generic_fields_for_title_templating() {
    let course = course_with_morning_block();
    let issues = course.blocks()[0].individual_issues(0, date("2024-01-01"));
    let fields = issues[0].generic_fields();

    assert_eq!(fields["#Issue"], "Morning");
    assert_eq!(fields["#I"], "M");
    assert_eq!(fields["#is"], "mo");
    assert_eq!(fields["#ISS"], "MOR");
    assert_eq!(fields["#issu"], "morn");
    assert_eq!(fields["#DAY"], "01");
    assert_eq!(fields["#MONTH"], "01");
    assert_eq!(fields["#YEAR"], "2024");
    assert_eq!(fields["#YR"], "24");
}

#[test]
fn display_forms_are_concise() {
    let mut issue = Issue::new("Morning");
    issue.set_day_of_week(Weekday::Mon, true);
    issue.set_day_of_week(Weekday::Wed, true);
    issue.set_day_of_week(Weekday::Fri, true);
    assert_eq!(issue.to_string(), "Morning (M-W-F--) +[] -[]");

    issue.add_addition(date("2024-01-06"));
    assert_eq!(issue.to_string(), "Morning (M-W-F--) +[2024-01-06] -[]");

    let course = course_with_morning_block();
    let rendered = course.blocks()[0].to_string();
    assert!(rendered.starts_with("2024-01-01 - 2024-01-14 ["));
}

#[test]
fn block_serializes_and_round_trips() {
    let course = course_with_morning_block();
    let block = course.blocks()[0].clone();
    let json = serde_json::to_string(&block).expect("serialize block");
    let round: Block = serde_json::from_str(&json).expect("deserialize block");
    assert_eq!(round, block);
    assert_eq!(round.count_individual_issues(), 6);
}

#[test]
fn empty_block_reports_empty() {
    let block = Block::new(None);
    assert!(block.is_empty());
    assert!(block.is_identified_by(None));
    assert!(!block.is_identified_by(Some("1")));
    assert_eq!(block.count_individual_issues(), 0);
}
