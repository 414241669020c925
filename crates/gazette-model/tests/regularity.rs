//! Tests for weekly regularity inference.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use gazette_model::{Course, Issue};
use proptest::prelude::*;

fn date(iso: &str) -> NaiveDate {
    iso.parse().expect("valid test date")
}

#[test]
fn infers_weekly_pattern_from_additions() {
    let mut issue = Issue::new("Morning");
    // the four Mondays of the range, plus one stray Wednesday
    for day in ["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22"] {
        issue.add_addition(date(day));
    }
    issue.add_addition(date("2024-01-10"));

    issue.recalculate_regularity(date("2024-01-01"), date("2024-01-28"));

    assert_eq!(issue.days_of_week(), &BTreeSet::from([1]));
    assert_eq!(
        issue.additions(),
        &BTreeSet::from([date("2024-01-10")]),
        "the stray Wednesday stays an addition"
    );
    assert!(issue.exclusions().is_empty());
}

#[test]
fn missed_regular_days_become_exclusions() {
    let mut issue = Issue::new("Morning");
    for day in ["2024-01-01", "2024-01-15", "2024-01-22"] {
        issue.add_addition(date(day));
    }

    issue.recalculate_regularity(date("2024-01-01"), date("2024-01-28"));

    assert_eq!(issue.days_of_week(), &BTreeSet::from([1]));
    assert!(issue.additions().is_empty());
    assert_eq!(
        issue.exclusions(),
        &BTreeSet::from([date("2024-01-08")]),
        "the skipped Monday becomes an exclusion"
    );
}

#[test]
fn equal_counts_resolve_to_irregular() {
    let mut issue = Issue::new("Morning");
    // two weeks, so every weekday occurs twice; one appearance is a tie
    issue.add_addition(date("2024-01-01"));

    issue.recalculate_regularity(date("2024-01-01"), date("2024-01-14"));

    assert!(issue.days_of_week().is_empty(), "a tie must not flip to regular");
    assert_eq!(issue.additions(), &BTreeSet::from([date("2024-01-01")]));
    assert!(issue.exclusions().is_empty());
}

#[test]
fn recalculation_preserves_the_match_set() {
    let mut issue = Issue::new("Morning");
    for day in ["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22", "2024-01-10"] {
        issue.add_addition(date(day));
    }
    let before: Vec<NaiveDate> = date("2024-01-01")
        .iter_days()
        .take_while(|day| *day <= date("2024-01-28"))
        .filter(|day| issue.is_match(*day))
        .collect();

    issue.recalculate_regularity(date("2024-01-01"), date("2024-01-28"));

    let after: Vec<NaiveDate> = date("2024-01-01")
        .iter_days()
        .take_while(|day| *day <= date("2024-01-28"))
        .filter(|day| issue.is_match(*day))
        .collect();
    assert_eq!(after, before);
}

#[test]
fn course_level_recalculation_covers_all_blocks() {
    let mut course = Course::new();
    for day in ["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22"] {
        course
            .add_addition(None, &[], "Morning", date(day))
            .expect("block expansion is free");
    }

    course.recalculate_regularity_of_issues();

    let issue = &course.blocks()[0].issues()[0];
    assert_eq!(issue.days_of_week(), &BTreeSet::from([1]));
    assert!(issue.additions().is_empty(), "regular Mondays need no additions");
}

proptest! {
    /// Running the inference twice with the same bounds and no intervening
    /// mutation yields the same pattern and exception sets.
    #[test]
    fn recalculation_is_idempotent(offsets in proptest::collection::btree_set(0u64..28, 0..15)) {
        let first = date("2024-01-01");
        let last = date("2024-01-28");
        let mut issue = Issue::new("Any");
        for offset in offsets {
            issue.add_addition(first + Days::new(offset));
        }

        issue.recalculate_regularity(first, last);
        let days = issue.days_of_week().clone();
        let additions = issue.additions().clone();
        let exclusions = issue.exclusions().clone();

        issue.recalculate_regularity(first, last);
        prop_assert_eq!(issue.days_of_week(), &days);
        prop_assert_eq!(issue.additions(), &additions);
        prop_assert_eq!(issue.exclusions(), &exclusions);
    }
}
