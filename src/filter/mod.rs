//! Multi-predicate record filtering.
//!
//! A [`FilterPredicateSet`] is evaluated against each record in a fixed order,
//! stopping at the first failing predicate:
//!
//! 1. type equality
//! 2. status equality
//! 3. property equality
//! 4. case-insensitive substring search over the record's id and name
//! 5. inclusive date range (the upper bound covers its whole day)
//!
//! Filtering is a single stable pass: every record is checked once against
//! all active predicates, and survivors keep their original relative order.
//!
//! # Examples
//!
//! ```rust
//! use ledgerlens::filter::{filter, FilterPredicateSet};
//! use ledgerlens::tasks::{Task, TaskState};
//!
//! let tasks = vec![
//!     Task::new("t-1", "extraction", TaskState::Pending),
//!     Task::new("t-2", "extraction", TaskState::Failed { error: "timeout".into() }),
//! ];
//! let failures = filter(&tasks, &FilterPredicateSet::default().with_status("FAILURE"));
//! assert_eq!(failures.len(), 1);
//! assert_eq!(failures[0].task_id, "t-2");
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod predicates;

use predicates::{
    end_of_day, matches_date_range, matches_equality, matches_search, start_of_day, ALL,
};

/// Read access to the fields the filter inspects.
pub trait Filterable {
    /// Record type (e.g. document type, task type)
    fn record_type(&self) -> Option<&str>;

    /// Status label as shown to users
    fn status(&self) -> Option<&str>;

    /// Property code the record belongs to
    fn property(&self) -> Option<&str>;

    /// Identifier, always searchable
    fn id(&self) -> &str;

    /// Human-readable name, searchable when present
    fn name(&self) -> Option<&str>;

    /// Timestamp used by the date range
    fn timestamp(&self) -> Option<NaiveDateTime>;
}

impl<T: Filterable + ?Sized> Filterable for &T {
    fn record_type(&self) -> Option<&str> {
        (**self).record_type()
    }
    fn status(&self) -> Option<&str> {
        (**self).status()
    }
    fn property(&self) -> Option<&str> {
        (**self).property()
    }
    fn id(&self) -> &str {
        (**self).id()
    }
    fn name(&self) -> Option<&str> {
        (**self).name()
    }
    fn timestamp(&self) -> Option<NaiveDateTime> {
        (**self).timestamp()
    }
}

/// User-selected filter settings.
///
/// `"all"` or an empty string disables an equality predicate, an empty
/// `search` disables search, and `None` leaves a date bound open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterPredicateSet {
    #[serde(rename = "type")]
    pub record_type: String,
    pub status: String,
    pub property: String,
    pub search: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl FilterPredicateSet {
    /// Every predicate disabled.
    pub fn all() -> Self {
        Self {
            record_type: ALL.to_string(),
            status: ALL.to_string(),
            property: ALL.to_string(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Resolve settings once so a filter pass does no per-record setup.
    fn compile(&self) -> CompiledPredicates<'_> {
        CompiledPredicates {
            record_type: &self.record_type,
            status: &self.status,
            property: &self.property,
            needle: self.search.trim().to_lowercase(),
            from: self.date_from.map(start_of_day),
            to: self.date_to.map(end_of_day),
        }
    }
}

/// Predicate stage, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    Type,
    Status,
    Property,
    Search,
    DateRange,
}

struct CompiledPredicates<'a> {
    record_type: &'a str,
    status: &'a str,
    property: &'a str,
    needle: String,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
}

impl CompiledPredicates<'_> {
    fn first_failure<T: Filterable + ?Sized>(&self, record: &T) -> Option<FilterStage> {
        if !matches_equality(self.record_type, record.record_type()) {
            return Some(FilterStage::Type);
        }
        if !matches_equality(self.status, record.status()) {
            return Some(FilterStage::Status);
        }
        if !matches_equality(self.property, record.property()) {
            return Some(FilterStage::Property);
        }
        if !matches_search(&self.needle, [Some(record.id()), record.name()]) {
            return Some(FilterStage::Search);
        }
        if !matches_date_range(self.from, self.to, record.timestamp()) {
            return Some(FilterStage::DateRange);
        }
        None
    }
}

/// Counts of what a filter pass rejected, by the predicate that rejected it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterMetrics {
    pub total_records: usize,
    pub rejected_by_type: usize,
    pub rejected_by_status: usize,
    pub rejected_by_property: usize,
    pub rejected_by_search: usize,
    pub rejected_by_date: usize,
    pub included: usize,
}

impl FilterMetrics {
    fn record(&mut self, outcome: Option<FilterStage>) {
        self.total_records += 1;
        match outcome {
            None => self.included += 1,
            Some(FilterStage::Type) => self.rejected_by_type += 1,
            Some(FilterStage::Status) => self.rejected_by_status += 1,
            Some(FilterStage::Property) => self.rejected_by_property += 1,
            Some(FilterStage::Search) => self.rejected_by_search += 1,
            Some(FilterStage::DateRange) => self.rejected_by_date += 1,
        }
    }

    /// Total records rejected, for any reason.
    pub fn total_rejected(&self) -> usize {
        self.total_records - self.included
    }
}

/// Whether a record passes every active predicate.
pub fn matches<T: Filterable + ?Sized>(record: &T, predicates: &FilterPredicateSet) -> bool {
    predicates.compile().first_failure(record).is_none()
}

/// The first predicate a record fails, if any.
pub fn rejection_stage<T: Filterable + ?Sized>(
    record: &T,
    predicates: &FilterPredicateSet,
) -> Option<FilterStage> {
    predicates.compile().first_failure(record)
}

/// Records passing every active predicate, in original order.
pub fn filter<'a, T: Filterable>(records: &'a [T], predicates: &FilterPredicateSet) -> Vec<&'a T> {
    let compiled = predicates.compile();
    records
        .iter()
        .filter(|record| compiled.first_failure(*record).is_none())
        .collect()
}

/// Like [`filter`], also reporting what was rejected and why.
pub fn filter_with_metrics<'a, T: Filterable>(
    records: &'a [T],
    predicates: &FilterPredicateSet,
) -> (Vec<&'a T>, FilterMetrics) {
    let compiled = predicates.compile();
    let mut metrics = FilterMetrics::default();
    let mut kept = Vec::new();
    for record in records {
        let outcome = compiled.first_failure(record);
        metrics.record(outcome);
        if outcome.is_none() {
            kept.push(record);
        }
    }
    (kept, metrics)
}
