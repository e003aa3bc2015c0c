//! # Query Module
//!
//! Structured, read-only queries over a snapshot of the record set.
//!
//! - Queries never mutate; they borrow the snapshot and return references
//! - Filters are independent and combine by logical AND
//! - Results keep store order unless a sort is requested; sorting is stable

use crate::{AttendanceBucket, Grade, PerformanceBucket, RosterError, Student};
use chrono::{Days, NaiveDate};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// FILTERS
// =============================================================================

/// A single predicate over a student record.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact letter grade.
    Grade(Grade),

    /// Age within `[min, max]`.
    AgeRange { min: u32, max: u32 },

    /// Performance within `[min, max]`.
    PerformanceRange { min: f64, max: f64 },

    /// Derived performance classification.
    PerformanceBucket(PerformanceBucket),

    /// Derived attendance classification.
    AttendanceBucket(AttendanceBucket),

    /// Case-insensitive substring of the course name.
    Course(String),

    /// Case-insensitive substring of the department.
    Department(String),

    /// Enrolled on or after `today - days`.
    EnrolledWithin { days: u32 },
}

impl Filter {
    /// Check whether `student` satisfies this filter, relative to `today`.
    #[must_use]
    pub fn matches(&self, student: &Student, today: NaiveDate) -> bool {
        match self {
            Filter::Grade(grade) => student.grade == *grade,
            Filter::AgeRange { min, max } => (*min..=*max).contains(&student.age),
            Filter::PerformanceRange { min, max } => {
                student.performance >= *min && student.performance <= *max
            }
            Filter::PerformanceBucket(bucket) => student.performance_bucket() == *bucket,
            Filter::AttendanceBucket(bucket) => student.attendance_bucket() == *bucket,
            Filter::Course(needle) => contains_ignore_case(&student.course, needle),
            Filter::Department(needle) => contains_ignore_case(&student.department, needle),
            Filter::EnrolledWithin { days } => {
                let cutoff = today
                    .checked_sub_days(Days::new(u64::from(*days)))
                    .unwrap_or(NaiveDate::MIN);
                student.enrollment_date >= cutoff
            }
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

// =============================================================================
// SORTING
// =============================================================================

/// Field a result list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Age,
    Performance,
    Attendance,
    EnrollmentDate,
}

impl SortKey {
    fn compare(self, a: &Student, b: &Student) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Age => a.age.cmp(&b.age),
            SortKey::Performance => a.performance.total_cmp(&b.performance),
            SortKey::Attendance => a.attendance.total_cmp(&b.attendance),
            SortKey::EnrollmentDate => a.enrollment_date.cmp(&b.enrollment_date),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Age => "age",
            SortKey::Performance => "performance",
            SortKey::Attendance => "attendance",
            SortKey::EnrollmentDate => "enrollment_date",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "student_id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            "age" => Ok(SortKey::Age),
            "performance" => Ok(SortKey::Performance),
            "attendance" => Ok(SortKey::Attendance),
            "enrollment_date" | "enrollment" => Ok(SortKey::EnrollmentDate),
            _ => Err(RosterError::Parse(format!("Unknown sort key: {}", s))),
        }
    }
}

/// Requested result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

// =============================================================================
// QUERY BUILDER
// =============================================================================

/// A chain of search text, filters and an optional sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentQuery {
    /// Free-text search; blank means no text constraint.
    pub text: Option<String>,
    /// Filters, combined by AND.
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
}

impl StudentQuery {
    /// Create a query that matches everything in store order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text search constraint.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order the results.
    #[must_use]
    pub fn sort_by(mut self, key: SortKey, descending: bool) -> Self {
        self.sort = Some(Sort { key, descending });
        self
    }

    /// Run the query over `snapshot`.
    #[must_use]
    pub fn run<'a>(&self, snapshot: &'a [Student], today: NaiveDate) -> Vec<&'a Student> {
        let needle = self
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        let mut results: Vec<&Student> = snapshot
            .iter()
            .filter(|s| needle.as_deref().is_none_or(|n| s.matches_text(n)))
            .filter(|s| self.filters.iter().all(|f| f.matches(s, today)))
            .collect();

        if let Some(sort) = self.sort {
            results.sort_by(|a, b| {
                let ordering = sort.key.compare(a, b);
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        results
    }
}

// =============================================================================
// SINGLE-STEP HELPERS
// =============================================================================

/// Case-insensitive search across name, email, course, department, phone and
/// id. Blank text returns the full snapshot.
#[must_use]
pub fn search<'a>(snapshot: &'a [Student], text: &str) -> Vec<&'a Student> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return snapshot.iter().collect();
    }
    snapshot.iter().filter(|s| s.matches_text(&needle)).collect()
}

/// Apply one filter to `snapshot`.
#[must_use]
pub fn apply<'a>(snapshot: &'a [Student], filter: &Filter, today: NaiveDate) -> Vec<&'a Student> {
    snapshot.iter().filter(|s| filter.matches(s, today)).collect()
}

// =============================================================================
// TESTS
// =============================================================================
