//! # CSV Transfer Module
//!
//! Export of the record set to CSV and row-validated bulk import from CSV.
//!
//! ## Export
//!
//! Columns are written in the fixed `EXPORT_COLUMNS` order. An empty store
//! exports the header line only.
//!
//! ## Import
//!
//! Import is split in two phases:
//! 1. `plan_import` parses and validates every row against a snapshot,
//!    without touching any state. Invalid rows become `RowError`s.
//! 2. The caller commits `ImportPlan::accepted` in one persisted step.
//!
//! A document the CSV reader rejects, or one with more than
//! `MAX_IMPORT_ROWS` data rows, fails the whole import; nothing is committed.

use crate::primitives::{MAX_IMPORT_ROWS, format_id, id_seq_in_range, parse_id_seq};
use crate::validator::StudentInput;
use crate::{Field, RosterError, Student};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Export column order.
pub const EXPORT_COLUMNS: [&str; 12] = [
    "student_id",
    "name",
    "age",
    "grade",
    "email",
    "performance",
    "phone",
    "course",
    "department",
    "enrollment_date",
    "attendance",
    "last_updated",
];

const ID_COLUMN: &str = "student_id";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn csv_err(e: impl fmt::Display) -> RosterError {
    RosterError::Parse(format!("Invalid CSV: {}", e))
}

// =============================================================================
// EXPORT
// =============================================================================

/// Render `students` as CSV text, header first.
pub fn export_csv(students: &[Student]) -> Result<String, RosterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(|e| RosterError::Persistence(e.to_string()))?;

    for student in students {
        writer
            .write_record(export_row(student))
            .map_err(|e| RosterError::Persistence(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RosterError::Persistence(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RosterError::Persistence(e.to_string()))
}

fn export_row(student: &Student) -> [String; 12] {
    [
        student.id.clone(),
        student.name.clone(),
        student.age.to_string(),
        student.grade.to_string(),
        student.email.clone(),
        student.performance.to_string(),
        student.phone.clone().unwrap_or_default(),
        student.course.clone(),
        student.department.clone(),
        student.enrollment_date.format(DATE_FORMAT).to_string(),
        student.attendance.to_string(),
        student.last_updated.format(TIMESTAMP_FORMAT).to_string(),
    ]
}

// =============================================================================
// IMPORT
// =============================================================================

/// Why one data row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub reasons: Vec<String>,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.reasons.join(", "))
    }
}

/// Outcome of validating a CSV document, before anything is committed.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    /// Fully formed records, in row order.
    pub accepted: Vec<Student>,
    pub errors: Vec<RowError>,
}

/// Outcome of a committed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    /// Human-readable summary with counts.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            format!("Imported {} students", self.imported)
        } else {
            format!(
                "Imported {} students. {} rows had errors",
                self.imported,
                self.errors.len()
            )
        }
    }

    /// One `Row <n>: ...` line per skipped row.
    #[must_use]
    pub fn error_strings(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Parse and validate `text` against the live set.
///
/// `existing` is the current snapshot and `high_water` the store's highest
/// accepted id sequence; rows without a `student_id` cell receive ids after
/// it, in row order. `now` stamps `last_updated` and is the reference for
/// future-date checks.
///
/// # Errors
/// `Parse` if the document is not well-formed CSV or exceeds
/// `MAX_IMPORT_ROWS` data rows.
pub fn plan_import(
    text: &str,
    existing: &[Student],
    high_water: u64,
    now: NaiveDateTime,
) -> Result<ImportPlan, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_ascii_lowercase(), index))
        .collect();

    let mut taken: HashSet<String> = existing.iter().map(|s| s.id.clone()).collect();
    let mut next_seq = high_water;
    let mut plan = ImportPlan::default();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        if row > MAX_IMPORT_ROWS {
            return Err(RosterError::Parse(format!(
                "Import exceeds maximum of {} rows",
                MAX_IMPORT_ROWS
            )));
        }
        let record = record.map_err(csv_err)?;
        let cell = |name: &str| columns.get(name).and_then(|i| record.get(*i));

        let mut input = StudentInput::default();
        for field in Field::ALL {
            if let Some(value) = cell(field.key()) {
                input.set(field, value);
            }
        }

        let id = cell(ID_COLUMN)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format_id(next_seq.saturating_add(1)));

        let student = match input.into_student(id, now) {
            Ok(student) => student,
            Err(e) => {
                let reasons = match e {
                    RosterError::Validation(violations) => {
                        violations.iter().map(ToString::to_string).collect()
                    }
                    other => vec![other.to_string()],
                };
                plan.errors.push(RowError { row, reasons });
                continue;
            }
        };

        if !id_seq_in_range(&student.id) {
            plan.errors.push(RowError {
                row,
                reasons: vec![format!(
                    "Student ID {} is beyond the last allocatable id",
                    student.id
                )],
            });
            continue;
        }

        if !taken.insert(student.id.clone()) {
            plan.errors.push(RowError {
                row,
                reasons: vec![format!("Student ID {} already exists", student.id)],
            });
            continue;
        }

        if let Some(seq) = parse_id_seq(&student.id) {
            next_seq = next_seq.max(seq);
        }
        plan.accepted.push(student);
    }

    tracing::debug!(
        accepted = plan.accepted.len(),
        rejected = plan.errors.len(),
        "import planned"
    );
    Ok(plan)
}

// =============================================================================
// TESTS
// =============================================================================
