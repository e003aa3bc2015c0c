//! # Core Type Definitions
//!
//! This module contains the value types shared by every Roster component:
//! - The `Student` entity and its `Activity` log entries
//! - Closed enumerations (`Grade`, `PerformanceBucket`, `AttendanceBucket`)
//! - Field naming (`Field`) and validation output (`Violation`)
//! - Error types (`RosterError`)
//!
//! ## Ordering Guarantees
//!
//! All enumerations implement `Ord` in declaration order so that fixed-domain
//! distributions keyed by them iterate deterministically in `BTreeMap`s.

use crate::primitives::{
    ATTENDANCE_AVERAGE, ATTENDANCE_EXCELLENT, ATTENDANCE_GOOD, DEFAULT_ATTENDANCE,
    PERFORMANCE_AVERAGE, PERFORMANCE_EXCELLENT, PERFORMANCE_GOOD,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Current local wall-clock time, the stamp used for `last_updated` and
/// activity entries.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Today's local calendar date.
#[must_use]
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// GRADE
// =============================================================================

/// Letter grade on the closed A–F scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Every grade, in distribution order.
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// Single-letter form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            _ => Err(RosterError::Parse(format!("Unknown grade: {}", s))),
        }
    }
}

// =============================================================================
// DERIVED BUCKETS
// =============================================================================

/// Coarse classification of a performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceBucket {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceBucket {
    /// Every bucket, best first.
    pub const ALL: [PerformanceBucket; 4] = [
        PerformanceBucket::Excellent,
        PerformanceBucket::Good,
        PerformanceBucket::Average,
        PerformanceBucket::NeedsImprovement,
    ];

    /// Classify a performance percentage.
    #[must_use]
    pub fn classify(performance: f64) -> Self {
        if performance >= PERFORMANCE_EXCELLENT {
            PerformanceBucket::Excellent
        } else if performance >= PERFORMANCE_GOOD {
            PerformanceBucket::Good
        } else if performance >= PERFORMANCE_AVERAGE {
            PerformanceBucket::Average
        } else {
            PerformanceBucket::NeedsImprovement
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceBucket::Excellent => "Excellent",
            PerformanceBucket::Good => "Good",
            PerformanceBucket::Average => "Average",
            PerformanceBucket::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for PerformanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PerformanceBucket {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "excellent" => Ok(PerformanceBucket::Excellent),
            "good" => Ok(PerformanceBucket::Good),
            "average" => Ok(PerformanceBucket::Average),
            "needsimprovement" => Ok(PerformanceBucket::NeedsImprovement),
            _ => Err(RosterError::Parse(format!(
                "Unknown performance status: {}",
                s
            ))),
        }
    }
}

/// Coarse classification of an attendance percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttendanceBucket {
    Excellent,
    Good,
    Average,
    Poor,
}

impl AttendanceBucket {
    /// Every bucket, best first.
    pub const ALL: [AttendanceBucket; 4] = [
        AttendanceBucket::Excellent,
        AttendanceBucket::Good,
        AttendanceBucket::Average,
        AttendanceBucket::Poor,
    ];

    /// Classify an attendance percentage.
    #[must_use]
    pub fn classify(attendance: f64) -> Self {
        if attendance >= ATTENDANCE_EXCELLENT {
            AttendanceBucket::Excellent
        } else if attendance >= ATTENDANCE_GOOD {
            AttendanceBucket::Good
        } else if attendance >= ATTENDANCE_AVERAGE {
            AttendanceBucket::Average
        } else {
            AttendanceBucket::Poor
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceBucket::Excellent => "Excellent",
            AttendanceBucket::Good => "Good",
            AttendanceBucket::Average => "Average",
            AttendanceBucket::Poor => "Poor",
        }
    }
}

impl fmt::Display for AttendanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceBucket {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "excellent" => Ok(AttendanceBucket::Excellent),
            "good" => Ok(AttendanceBucket::Good),
            "average" => Ok(AttendanceBucket::Average),
            "poor" => Ok(AttendanceBucket::Poor),
            _ => Err(RosterError::Parse(format!(
                "Unknown attendance status: {}",
                s
            ))),
        }
    }
}

/// Lowercase and drop separators so "Needs Improvement", "needs_improvement"
/// and "NeedsImprovement" compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// ACTIVITY LOG
// =============================================================================

/// One entry in a student's append-only activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// 1-based position in the log.
    pub seq: u32,
    /// Activity type ("Assignment", "Exam", ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub timestamp: NaiveDateTime,
}

// =============================================================================
// STUDENT
// =============================================================================

fn default_attendance() -> f64 {
    DEFAULT_ATTENDANCE
}

/// A student record.
///
/// Owned exclusively by the record store. Readers receive shared references
/// or clones; changes go through `StudentUpdate` so that every visible
/// record stays within its field bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "student_id")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub grade: Grade,
    pub email: String,
    pub performance: f64,
    pub phone: Option<String>,
    pub course: String,
    pub department: String,
    #[serde(default = "default_attendance")]
    pub attendance: f64,
    pub enrollment_date: NaiveDate,
    pub last_updated: NaiveDateTime,
    #[serde(default)]
    pub activity_log: Vec<Activity>,
}

impl Student {
    /// Derived performance classification.
    #[must_use]
    pub fn performance_bucket(&self) -> PerformanceBucket {
        PerformanceBucket::classify(self.performance)
    }

    /// Derived attendance classification.
    #[must_use]
    pub fn attendance_bucket(&self) -> AttendanceBucket {
        AttendanceBucket::classify(self.attendance)
    }

    /// Case-insensitive substring match over the searchable text fields.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let haystacks = [
            self.name.as_str(),
            self.email.as_str(),
            self.course.as_str(),
            self.department.as_str(),
            self.phone.as_deref().unwrap_or(""),
            self.id.as_str(),
        ];
        haystacks
            .iter()
            .any(|h| h.to_lowercase().contains(needle))
    }

    /// Append an activity entry stamped `at`.
    pub(crate) fn push_activity(
        &mut self,
        kind: impl Into<String>,
        description: impl Into<String>,
        at: NaiveDateTime,
    ) -> &Activity {
        let seq = u32::try_from(self.activity_log.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.activity_log.push(Activity {
            seq,
            kind: kind.into(),
            description: description.into(),
            timestamp: at,
        });
        &self.activity_log[self.activity_log.len() - 1]
    }
}

// =============================================================================
// FIELDS & VIOLATIONS
// =============================================================================

/// The named, caller-visible fields of a student record.
///
/// This is the closed set of names accepted by partial updates; anything
/// else is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Age,
    Grade,
    Email,
    Performance,
    Phone,
    Course,
    Department,
    Attendance,
    EnrollmentDate,
}

impl Field {
    /// Every updatable field.
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Age,
        Field::Grade,
        Field::Email,
        Field::Performance,
        Field::Phone,
        Field::Course,
        Field::Department,
        Field::Attendance,
        Field::EnrollmentDate,
    ];

    /// Wire name (column / JSON key).
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Age => "age",
            Field::Grade => "grade",
            Field::Email => "email",
            Field::Performance => "performance",
            Field::Phone => "phone",
            Field::Course => "course",
            Field::Department => "department",
            Field::Attendance => "attendance",
            Field::EnrollmentDate => "enrollment_date",
        }
    }

    /// Label used in messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Age => "Age",
            Field::Grade => "Grade",
            Field::Email => "Email",
            Field::Performance => "Performance",
            Field::Phone => "Phone",
            Field::Course => "Course",
            Field::Department => "Department",
            Field::Attendance => "Attendance",
            Field::EnrollmentDate => "Enrollment date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| RosterError::UnknownField(s.to_string()))
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: Field,
    pub message: String,
}

impl Violation {
    #[must_use]
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Roster system.
///
/// - No silent failures
/// - Use `Result<T, RosterError>` for fallible operations
/// - Validation failures carry the full violation list as data
/// - After any error, memory and the persisted backing are unchanged
#[derive(Debug, Error)]
pub enum RosterError {
    /// One or more fields failed validation.
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    /// No student with this id exists.
    #[error("Student not found: {0}")]
    NotFound(String),

    /// A student with this id already exists.
    #[error("Student ID already exists: {0}")]
    DuplicateId(String),

    /// A partial update named a field outside the updatable set.
    #[error("Unknown or read-only field: {0}")]
    UnknownField(String),

    /// Saving or loading the persisted store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Malformed CSV or JSON input.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RosterError {
    /// The violation list, if this is a validation failure.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            RosterError::Validation(v) => v,
            _ => &[],
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
