use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::block::Block;
use crate::error::{CourseError, Result};
use crate::granularity::{BreakMark, Granularity};
use crate::individual::IndividualIssue;
use crate::issue::Issue;
use crate::metadata::{CountableMetadata, IssuePoint};
use crate::year::YearStart;

const WEEKDAY_PAGES: u64 = 40;
const SUNDAY_PAGES: u64 = 240;

/// User-facing message collaborator. The core never owns translations; hosts
/// inject a resolver so overlap reports can be localized.
pub trait MessageSink {
    /// Resolves a message key to display text.
    fn translate(&self, key: &str) -> String;

    /// Surfaces an error message to the user.
    fn error(&self, message: &str);
}

/// How bound setters handle a publication period that would overlap a
/// sibling block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Report the violation through the message sink and commit the bound
    /// anyway. This is the compatibility default: single-field setters in the
    /// original system reported the conflict but did not enforce it.
    #[default]
    Lenient,
    /// Reject the mutation and leave the block untouched.
    Strict,
}

/// The course of appearance of a newspaper: one or more blocks of time.
/// Interruptions in the course of appearance are modeled by subsequent
/// blocks.
///
/// The course owns its blocks, and blocks own their issues; both are
/// addressed by position. Every mutation that can change the set of
/// physically appeared issues goes through a method on this type, which
/// keeps one choke point for invalidating the derived process groups.
///
/// The process groups themselves are a cache: they are built by
/// [`Course::split_into`] (or prefilled by the XML importer) and cleared by
/// [`Course::clear_processes`] whenever a structural edit could change the
/// derivation. While `processes_are_volatile` is off, clearing is suspended;
/// the importer uses this to keep the groups it reads from the document.
pub struct Course {
    blocks: Vec<Block>,
    processes: Vec<Vec<IndividualIssue>>,
    processes_are_volatile: bool,
    /// The name of the year, such as "business year" or "season".
    year_name: String,
    year_start: YearStart,
    overlap_policy: OverlapPolicy,
    message_sink: Option<Arc<dyn MessageSink>>,
    variant_cache: HashMap<Option<String>, usize>,
}

impl Default for Course {
    fn default() -> Self {
        Course {
            blocks: Vec::new(),
            processes: Vec::new(),
            processes_are_volatile: true,
            year_name: String::new(),
            year_start: YearStart::JANUARY_1,
            overlap_policy: OverlapPolicy::default(),
            message_sink: None,
            variant_cache: HashMap::new(),
        }
    }
}

impl Course {
    pub fn new() -> Course {
        Course::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends a block. The process cache is dropped when the block already
    /// produces stampings.
    pub fn add_block(&mut self, block: Block) -> usize {
        if block.count_individual_issues() > 0 {
            self.processes.clear();
        }
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// Creates and appends an empty block with the given variant identifier.
    pub fn append_block(&mut self, variant: Option<String>) -> usize {
        self.add_block(Block::new(variant))
    }

    /// Removes the block at the given position. Subsequent blocks shift
    /// left, so the variant lookup cache is dropped wholesale.
    pub fn remove_block(&mut self, index: usize) -> Block {
        let block = self.blocks.remove(index);
        self.variant_cache.clear();
        if block.count_individual_issues() > 0 {
            self.processes.clear();
        }
        block
    }

    /// Sets the day of first appearance of a block. If the last appearance
    /// is still unset it is initialized to the same date, so both bounds
    /// travel together once either is set.
    ///
    /// An overlap with a sibling block is handled per the course's
    /// [`OverlapPolicy`]: reported and committed anyway (lenient, default),
    /// or rejected (strict).
    pub fn set_first_appearance(&mut self, block: usize, date: NaiveDate) -> Result<()> {
        let until = self.blocks[block].last_appearance().unwrap_or(date);
        if let Err(error) = self.prohibit_overlaps(block, date, until) {
            match self.overlap_policy {
                OverlapPolicy::Strict => return Err(error),
                OverlapPolicy::Lenient => self.report_overlap(&error),
            }
        }
        if self.blocks[block].first_appearance() != Some(date) {
            self.clear_processes();
        }
        let target = &mut self.blocks[block];
        target.set_first_appearance_raw(Some(date));
        if target.last_appearance().is_none() {
            target.set_last_appearance_raw(Some(date));
        }
        Ok(())
    }

    /// Sets the day of last appearance of a block. Counterpart of
    /// [`Course::set_first_appearance`].
    pub fn set_last_appearance(&mut self, block: usize, date: NaiveDate) -> Result<()> {
        let from = self.blocks[block].first_appearance().unwrap_or(date);
        if let Err(error) = self.prohibit_overlaps(block, from, date) {
            match self.overlap_policy {
                OverlapPolicy::Strict => return Err(error),
                OverlapPolicy::Lenient => self.report_overlap(&error),
            }
        }
        if self.blocks[block].last_appearance() != Some(date) {
            self.clear_processes();
        }
        let target = &mut self.blocks[block];
        target.set_last_appearance_raw(Some(date));
        if target.first_appearance().is_none() {
            target.set_first_appearance_raw(Some(date));
        }
        Ok(())
    }

    /// Sets both bounds of a block at once. Unlike the single-field setters,
    /// an overlap is always rejected and nothing is committed, regardless of
    /// the overlap policy.
    pub fn set_publication_period(
        &mut self,
        block: usize,
        first_appearance: NaiveDate,
        last_appearance: NaiveDate,
    ) -> Result<()> {
        self.prohibit_overlaps(block, first_appearance, last_appearance)?;
        let changed = {
            let target = &self.blocks[block];
            target.first_appearance() != Some(first_appearance)
                || target.last_appearance() != Some(last_appearance)
        };
        if changed {
            self.clear_processes();
        }
        let target = &mut self.blocks[block];
        target.set_first_appearance_raw(Some(first_appearance));
        target.set_last_appearance_raw(Some(last_appearance));
        Ok(())
    }

    /// Tests a not-yet-committed time range against all sibling blocks with
    /// both bounds set, using the closed-interval intersection test.
    fn prohibit_overlaps(&self, excluding: usize, from: NaiveDate, until: NaiveDate) -> Result<()> {
        for (index, other) in self.blocks.iter().enumerate() {
            if index == excluding {
                continue;
            }
            let (Some(other_first), Some(other_last)) =
                (other.first_appearance(), other.last_appearance())
            else {
                continue;
            };
            if (other_first < until && other_last >= from)
                || (other_last > from && other_first <= until)
            {
                return Err(CourseError::Overlap {
                    variant: other.variant().map(str::to_owned),
                    first: other_first,
                    last: other_last,
                });
            }
        }
        Ok(())
    }

    fn report_overlap(&self, error: &CourseError) {
        tracing::warn!(%error, "overlapping publication period reported but committed");
        if let Some(sink) = &self.message_sink {
            sink.error(&format!(
                "{}: {error}",
                sink.translate("calendar.block.overlaps")
            ));
        }
    }

    /// Appends an issue to a block, dropping the process cache when the
    /// issue produces stampings in the block's range, or when the range
    /// cannot be evaluated.
    pub fn push_issue(&mut self, block: usize, issue: Issue) -> usize {
        if self.blocks[block].issue_contributes(&issue) {
            self.clear_processes();
        }
        self.blocks[block].push_issue(issue)
    }

    /// Creates and appends an empty issue, returning its position.
    pub fn add_issue(&mut self, block: usize) -> usize {
        self.push_issue(block, Issue::new(""))
    }

    /// Removes an issue from a block. Counter metadata created at the
    /// removed issue is dropped, and remaining issue positions are rewritten.
    pub fn remove_issue(&mut self, block: usize, issue: usize) -> Issue {
        let contributes = {
            let target = &self.blocks[block];
            target.issue_contributes(&target.issues()[issue])
        };
        if contributes {
            self.clear_processes();
        }
        self.blocks[block].remove_issue_raw(issue)
    }

    /// Records a date on which the issue appeared outside its weekly
    /// pattern. Returns whether the set changed.
    pub fn add_issue_addition(&mut self, block: usize, issue: usize, date: NaiveDate) -> bool {
        self.clear_processes();
        self.blocks[block].issue_mut(issue).add_addition(date)
    }

    pub fn remove_issue_addition(&mut self, block: usize, issue: usize, date: NaiveDate) -> bool {
        self.clear_processes();
        self.blocks[block].issue_mut(issue).remove_addition(date)
    }

    /// Records a date on which the issue did not appear despite its weekly
    /// pattern. Returns whether the set changed.
    pub fn add_issue_exclusion(&mut self, block: usize, issue: usize, date: NaiveDate) -> bool {
        self.clear_processes();
        self.blocks[block].issue_mut(issue).add_exclusion(date)
    }

    pub fn remove_issue_exclusion(&mut self, block: usize, issue: usize, date: NaiveDate) -> bool {
        self.clear_processes();
        self.blocks[block].issue_mut(issue).remove_exclusion(date)
    }

    /// Toggles a weekday of an issue's regular appearance. The process cache
    /// is only dropped when the pattern actually changed.
    pub fn set_issue_day_of_week(
        &mut self,
        block: usize,
        issue: usize,
        weekday: Weekday,
        regular: bool,
    ) -> bool {
        let changed = self.blocks[block]
            .issue_mut(issue)
            .set_day_of_week(weekday, regular);
        if changed {
            self.clear_processes();
        }
        changed
    }

    /// Renames an issue. The process cache is only dropped when the heading
    /// actually changed.
    pub fn set_issue_heading(&mut self, block: usize, issue: usize, heading: &str) -> bool {
        let changed = self.blocks[block].issue_mut(issue).set_heading(heading);
        if changed {
            self.clear_processes();
        }
        changed
    }

    /// Records one appeared issue, creating whatever is missing on the way:
    /// the block for the variant, the issues named in `before_issues` (in
    /// order, so the issue list reflects the declared presentation order),
    /// and the target issue itself. The block's bounds are expanded to cover
    /// the date if needed.
    ///
    /// Note that expanding a block in which issues have a regular appearance
    /// set makes the regularly appearing issues show up in the expanded range
    /// as well; this method is meant for building a course from individually
    /// recorded appearances.
    ///
    /// An overlap caused by the expansion is always an error, wrapped with
    /// the variant and date that triggered it.
    pub fn add_addition(
        &mut self,
        variant: Option<&str>,
        before_issues: &[String],
        issue_heading: &str,
        date: NaiveDate,
    ) -> Result<IndividualIssue> {
        let (block_index, fresh) = match self.block_by_variant(variant) {
            Some(index) => (index, false),
            None => (self.append_block(variant.map(str::to_owned)), true),
        };
        let target = &self.blocks[block_index];
        let first = target
            .first_appearance()
            .map_or(date, |first| first.min(date));
        let last = target.last_appearance().map_or(date, |last| last.max(date));
        if target.first_appearance() != Some(first) || target.last_appearance() != Some(last) {
            if let Err(source) = self.set_publication_period(block_index, first, last) {
                if fresh {
                    self.remove_block(block_index);
                }
                return Err(CourseError::ExpansionOverlap {
                    variant: variant.map(str::to_owned),
                    date,
                    source: Box::new(source),
                });
            }
        }
        for heading in before_issues {
            if self.blocks[block_index]
                .issue_index_by_heading(heading)
                .is_none()
            {
                self.push_issue(block_index, Issue::new(heading.clone()));
            }
        }
        let issue_index = match self.blocks[block_index].issue_index_by_heading(issue_heading) {
            Some(index) => index,
            None => self.push_issue(block_index, Issue::new(issue_heading)),
        };
        self.add_issue_addition(block_index, issue_index, date);
        let issue = &self.blocks[block_index].issues()[issue_index];
        Ok(IndividualIssue::new(
            block_index,
            issue_index,
            issue,
            date,
            None,
        ))
    }

    /// Resolves a block by its variant identifier, `None` addressing the
    /// unnamed block. Hits are memoized; a memo whose block no longer
    /// carries the variant is evicted and the scan repeated.
    pub fn block_by_variant(&mut self, variant: Option<&str>) -> Option<usize> {
        let key = variant.map(str::to_owned);
        if let Some(&cached) = self.variant_cache.get(&key) {
            if self
                .blocks
                .get(cached)
                .is_some_and(|block| block.is_identified_by(variant))
            {
                return Some(cached);
            }
            self.variant_cache.remove(&key);
        }
        let found = self
            .blocks
            .iter()
            .position(|block| block.is_identified_by(variant))?;
        self.variant_cache.insert(key, found);
        Some(found)
    }

    /// The date the regularity of this course of appearance starts with.
    pub fn first_appearance(&self) -> Option<NaiveDate> {
        self.blocks.iter().filter_map(Block::first_appearance).min()
    }

    /// The date the regularity of this course of appearance ends with.
    pub fn last_appearance(&self) -> Option<NaiveDate> {
        self.blocks.iter().filter_map(Block::last_appearance).max()
    }

    /// The first block whose interval covers the date. Since blocks must not
    /// overlap there is at most one.
    pub fn block_matching(&self, date: NaiveDate) -> Option<usize> {
        self.blocks.iter().position(|block| block.covers(date))
    }

    /// Generates the stampings of all physically appeared issues, walking
    /// day by day from the overall first to the overall last appearance and
    /// collecting from every block. The result is in date order and free of
    /// duplicates by construction.
    pub fn individual_issues(&self) -> Vec<IndividualIssue> {
        let (Some(first), Some(last)) = (self.first_appearance(), self.last_appearance()) else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for day in first.iter_days().take_while(|day| *day <= last) {
            for (index, block) in self.blocks.iter().enumerate() {
                result.extend(block.individual_issues(index, day));
            }
        }
        result
    }

    /// Counts the stampings of issues that physically appeared without
    /// materializing them.
    pub fn count_individual_issues(&self) -> u64 {
        self.blocks.iter().map(Block::count_individual_issues).sum()
    }

    /// A guessed total number of pages for the full course of appearance,
    /// presuming 40 pages per issue and 240 for Sunday issues.
    pub fn guess_total_pages(&self) -> u64 {
        let mut total = 0;
        for block in &self.blocks {
            let (Some(first), Some(last)) = (block.first_appearance(), block.last_appearance())
            else {
                continue;
            };
            for day in first.iter_days().take_while(|day| *day <= last) {
                for issue in block.issues() {
                    if issue.is_match(day) {
                        total += if day.weekday() == Weekday::Sun {
                            SUNDAY_PAGES
                        } else {
                            WEEKDAY_PAGES
                        };
                    }
                }
            }
        }
        total
    }

    /// Re-derives the weekly pattern of every issue in every block. This is
    /// especially sensible after lots of issues whose existence is known
    /// have been recorded one by one as additions.
    pub fn recalculate_regularity_of_issues(&mut self) {
        for block in &mut self.blocks {
            block.recalculate_regularity_of_issues();
        }
    }

    /// Partitions the individual issues into process groups: a new group
    /// starts whenever the break mark for the chosen granularity differs
    /// from the previous issue's mark.
    pub fn split_into(&mut self, mode: Granularity) {
        self.processes.clear();
        let mut process: Vec<IndividualIssue> = Vec::new();
        let mut last_mark: Option<BreakMark> = None;
        for issue in self.individual_issues() {
            let mark = issue.break_mark(mode, self.year_start);
            if last_mark.is_some_and(|last| last != mark) && !process.is_empty() {
                self.processes.push(std::mem::take(&mut process));
            }
            process.push(issue);
            last_mark = Some(mark);
        }
        if !process.is_empty() {
            self.processes.push(process);
        }
        tracing::debug!(
            processes = self.processes.len(),
            granularity = %mode,
            "split course into processes"
        );
    }

    /// The process groups to create from the course of appearance, as built
    /// by [`Course::split_into`] or recovered by the XML importer.
    pub fn processes(&self) -> &[Vec<IndividualIssue>] {
        &self.processes
    }

    pub fn number_of_processes(&self) -> usize {
        self.processes.len()
    }

    /// Drops the derived process groups. Called from every mutation path
    /// that could change the set of physically appeared issues; a no-op
    /// while `processes_are_volatile` is off.
    pub fn clear_processes(&mut self) {
        if self.processes_are_volatile {
            self.processes.clear();
        }
    }

    pub fn processes_are_volatile(&self) -> bool {
        self.processes_are_volatile
    }

    /// Suspends or re-arms process cache invalidation. The XML importer
    /// suspends it so the groups read from the document survive the
    /// construction edits.
    pub fn set_processes_volatile(&mut self, volatile: bool) {
        self.processes_are_volatile = volatile;
    }

    /// Appends a ready process group, bypassing derivation. Used by the XML
    /// importer to keep the grouping recorded in the document.
    pub fn push_process(&mut self, process: Vec<IndividualIssue>) {
        self.processes.push(process);
    }

    /// The name of the year, such as "business year" or "season". Optional
    /// and maybe empty.
    pub fn year_name(&self) -> &str {
        &self.year_name
    }

    pub fn set_year_name(&mut self, year_name: impl Into<String>) {
        self.year_name = year_name.into();
    }

    /// The first day of the year. Typically January 1, but business years
    /// and seasons may start elsewhere.
    pub fn year_start(&self) -> YearStart {
        self.year_start
    }

    pub fn set_year_start(&mut self, year_start: YearStart) {
        self.year_start = year_start;
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap_policy
    }

    pub fn set_overlap_policy(&mut self, overlap_policy: OverlapPolicy) {
        self.overlap_policy = overlap_policy;
    }

    pub fn set_message_sink(&mut self, sink: Arc<dyn MessageSink>) {
        self.message_sink = Some(sink);
    }

    /// Whether a block carries two issues with the same heading; if so, the
    /// finding is reported through the message sink.
    pub fn check_duplicate_headings(&self, block: usize) -> bool {
        let duplicated = self.blocks[block].has_duplicate_headings();
        if duplicated {
            if let Some(sink) = &self.message_sink {
                sink.error(&format!(
                    "{} (Block {})",
                    sink.translate("duplicatedTitles"),
                    block + 1
                ));
            }
        }
        duplicated
    }

    /// Attaches a counter to a block, in front of the existing counters.
    pub fn add_metadata(&mut self, block: usize, metadata: CountableMetadata) {
        self.blocks[block].insert_metadata_front(metadata);
    }

    /// Detaches the counter at the given position of a block's counter list.
    pub fn remove_metadata(&mut self, block: usize, index: usize) -> CountableMetadata {
        self.blocks[block].remove_metadata(index)
    }

    /// Records the point a counter is replaced at.
    pub fn set_metadata_delete(&mut self, block: usize, index: usize, delete: Option<IssuePoint>) {
        self.blocks[block].metadata_mut(index).set_delete(delete);
    }
}

impl fmt::Debug for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Course")
            .field("blocks", &self.blocks)
            .field("processes", &self.processes)
            .field("processes_are_volatile", &self.processes_are_volatile)
            .field("year_name", &self.year_name)
            .field("year_start", &self.year_start)
            .field("overlap_policy", &self.overlap_policy)
            .finish_non_exhaustive()
    }
}
