//! # Validator Module
//!
//! Field-level validation for student records.
//!
//! - Every field is checked independently
//! - All violations are collected, never fail-fast
//! - Unparsable numbers produce a "must be a valid number" violation
//! - Validation never mutates its input

use crate::primitives::{
    DEFAULT_ATTENDANCE, DEFAULT_DEPARTMENT, MAX_AGE, MAX_PERCENT, MIN_AGE, MIN_PERCENT,
    MIN_PHONE_LENGTH, MIN_TEXT_LENGTH,
};
use crate::types::local_today;
use crate::{Field, Grade, RosterError, Student, Violation};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").ok());

static PHONE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").ok());

const NAME_MESSAGE: &str =
    "Full name must be at least 2 characters long and contain only letters and spaces";
pub(crate) const AGE_RANGE_MESSAGE: &str = "Age must be between 15 and 70 years";
const GRADE_MESSAGE: &str = "Grade must be one of: A, B, C, D, F";
const EMAIL_MESSAGE: &str = "Please enter a valid email address format";
const PHONE_MESSAGE: &str = "Please enter a valid phone number format";
const COURSE_MESSAGE: &str = "Course name must be at least 2 characters long";
const DEPARTMENT_MESSAGE: &str = "Department must not be empty";
const DATE_FORMAT_MESSAGE: &str = "Enrollment date must be a valid YYYY-MM-DD date";
const DATE_FUTURE_MESSAGE: &str = "Enrollment date cannot be in the future";

// =============================================================================
// RAW INPUT
// =============================================================================

/// Unvalidated student fields as text, the shape of form submissions,
/// CSV rows and HTTP bodies.
///
/// `None` means the field was not supplied at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    #[serde(default, deserialize_with = "text_or_number")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub performance: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub course: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub attendance: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub enrollment_date: Option<String>,
}

/// Accept JSON strings and numbers alike, so `"age": 20` and `"age": "20"`
/// both reach the validator as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl StudentInput {
    /// Text value of a field, if supplied.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::Name => &self.name,
            Field::Age => &self.age,
            Field::Grade => &self.grade,
            Field::Email => &self.email,
            Field::Performance => &self.performance,
            Field::Phone => &self.phone,
            Field::Course => &self.course,
            Field::Department => &self.department,
            Field::Attendance => &self.attendance,
            Field::EnrollmentDate => &self.enrollment_date,
        };
        slot.as_deref()
    }

    /// Set a field's text value.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Age => &mut self.age,
            Field::Grade => &mut self.grade,
            Field::Email => &mut self.email,
            Field::Performance => &mut self.performance,
            Field::Phone => &mut self.phone,
            Field::Course => &mut self.course,
            Field::Department => &mut self.department,
            Field::Attendance => &mut self.attendance,
            Field::EnrollmentDate => &mut self.enrollment_date,
        };
        *slot = Some(value.into());
    }

    /// Builder form of [`StudentInput::set`].
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Validate and build a typed record with the given id.
    ///
    /// Optional fields fall back to their defaults (attendance 95.0,
    /// department "General", enrollment today). Returns
    /// `RosterError::Validation` with every violation if any field fails.
    pub fn into_student(&self, id: String, now: NaiveDateTime) -> Result<Student, RosterError> {
        let checked = Validator::check_input(self, now.date()).map_err(RosterError::Validation)?;

        Ok(Student {
            id,
            name: checked.name,
            age: checked.age,
            grade: checked.grade,
            email: checked.email,
            performance: checked.performance,
            phone: checked.phone,
            course: checked.course,
            department: checked
                .department
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
            attendance: checked.attendance.unwrap_or(DEFAULT_ATTENDANCE),
            enrollment_date: checked.enrollment_date.unwrap_or(now.date()),
            last_updated: now,
            activity_log: Vec::new(),
        })
    }
}

/// Typed values extracted from a fully valid `StudentInput`.
#[derive(Debug, Clone)]
pub(crate) struct CheckedInput {
    pub name: String,
    pub age: u32,
    pub grade: Grade,
    pub email: String,
    pub performance: f64,
    pub phone: Option<String>,
    pub course: String,
    pub department: Option<String>,
    pub attendance: Option<f64>,
    pub enrollment_date: Option<NaiveDate>,
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// The Validator checks student data against the field rules.
pub struct Validator;

impl Validator {
    /// Validate raw text input. Returns every violation; empty means valid.
    #[must_use]
    pub fn validate_input(input: &StudentInput) -> Vec<Violation> {
        match Self::check_input(input, local_today()) {
            Ok(_) => Vec::new(),
            Err(violations) => violations,
        }
    }

    /// Validate a typed record. Returns every violation; empty means valid.
    #[must_use]
    pub fn validate_student(student: &Student) -> Vec<Violation> {
        let mut violations = Vec::new();

        if !name_ok(&student.name) {
            violations.push(Violation::new(Field::Name, NAME_MESSAGE));
        }
        if !age_ok(i64::from(student.age)) {
            violations.push(Violation::new(Field::Age, AGE_RANGE_MESSAGE));
        }
        if !email_ok(&student.email) {
            violations.push(Violation::new(Field::Email, EMAIL_MESSAGE));
        }
        if !percent_ok(student.performance) {
            violations.push(percent_violation(Field::Performance));
        }
        if let Some(phone) = student.phone.as_deref().filter(|p| !p.is_empty()) {
            if !phone_ok(phone) {
                violations.push(Violation::new(Field::Phone, PHONE_MESSAGE));
            }
        }
        if !course_ok(&student.course) {
            violations.push(Violation::new(Field::Course, COURSE_MESSAGE));
        }
        if student.department.trim().is_empty() {
            violations.push(Violation::new(Field::Department, DEPARTMENT_MESSAGE));
        }
        if !percent_ok(student.attendance) {
            violations.push(percent_violation(Field::Attendance));
        }
        if student.enrollment_date > student.last_updated.date() {
            violations.push(Violation::new(Field::EnrollmentDate, DATE_FUTURE_MESSAGE));
        }

        violations
    }

    /// Check raw input against `today`, returning typed values or every
    /// violation found.
    pub(crate) fn check_input(
        input: &StudentInput,
        today: NaiveDate,
    ) -> Result<CheckedInput, Vec<Violation>> {
        let mut violations = Vec::new();

        let name = required(input, Field::Name, &mut violations).and_then(|raw| {
            let trimmed = raw.trim();
            if name_ok(trimmed) {
                Some(trimmed.to_string())
            } else {
                violations.push(Violation::new(Field::Name, NAME_MESSAGE));
                None
            }
        });

        let age = required(input, Field::Age, &mut violations).and_then(|raw| {
            match raw.trim().parse::<i64>() {
                Ok(age) if age_ok(age) => u32::try_from(age).ok(),
                Ok(_) => {
                    violations.push(Violation::new(Field::Age, AGE_RANGE_MESSAGE));
                    None
                }
                Err(_) => {
                    violations.push(number_violation(Field::Age));
                    None
                }
            }
        });

        let grade = required(input, Field::Grade, &mut violations).and_then(|raw| {
            raw.parse::<Grade>().map_or_else(
                |_| {
                    violations.push(Violation::new(Field::Grade, GRADE_MESSAGE));
                    None
                },
                Some,
            )
        });

        let email = required(input, Field::Email, &mut violations).and_then(|raw| {
            let trimmed = raw.trim();
            if email_ok(trimmed) {
                Some(trimmed.to_string())
            } else {
                violations.push(Violation::new(Field::Email, EMAIL_MESSAGE));
                None
            }
        });

        let performance = required(input, Field::Performance, &mut violations)
            .and_then(|raw| parse_percent(Field::Performance, raw, &mut violations));

        let phone = optional(input, Field::Phone).and_then(|raw| {
            if phone_ok(raw) {
                Some(raw.to_string())
            } else {
                violations.push(Violation::new(Field::Phone, PHONE_MESSAGE));
                None
            }
        });

        let course = required(input, Field::Course, &mut violations).and_then(|raw| {
            let trimmed = raw.trim();
            if course_ok(trimmed) {
                Some(trimmed.to_string())
            } else {
                violations.push(Violation::new(Field::Course, COURSE_MESSAGE));
                None
            }
        });

        let department = optional(input, Field::Department).map(str::to_string);

        let attendance = optional(input, Field::Attendance)
            .and_then(|raw| parse_percent(Field::Attendance, raw, &mut violations));

        let enrollment_date = optional(input, Field::EnrollmentDate).and_then(|raw| {
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date <= today => Some(date),
                Ok(_) => {
                    violations.push(Violation::new(Field::EnrollmentDate, DATE_FUTURE_MESSAGE));
                    None
                }
                Err(_) => {
                    violations.push(Violation::new(Field::EnrollmentDate, DATE_FORMAT_MESSAGE));
                    None
                }
            }
        });

        match (name, age, grade, email, performance, course) {
            (Some(name), Some(age), Some(grade), Some(email), Some(performance), Some(course))
                if violations.is_empty() =>
            {
                Ok(CheckedInput {
                    name,
                    age,
                    grade,
                    email,
                    performance,
                    phone,
                    course,
                    department,
                    attendance,
                    enrollment_date,
                })
            }
            _ => Err(violations),
        }
    }
}

// =============================================================================
// FIELD RULES
// =============================================================================

fn required<'a>(
    input: &'a StudentInput,
    field: Field,
    violations: &mut Vec<Violation>,
) -> Option<&'a str> {
    match input.get(field) {
        Some(raw) if !raw.trim().is_empty() => Some(raw),
        _ => {
            violations.push(Violation::new(
                field,
                format!("{} is required", field.label()),
            ));
            None
        }
    }
}

fn optional(input: &StudentInput, field: Field) -> Option<&str> {
    input
        .get(field)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
}

fn parse_percent(field: Field, raw: &str, violations: &mut Vec<Violation>) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if percent_ok(value) => Some(value),
        Ok(_) => {
            violations.push(percent_violation(field));
            None
        }
        Err(_) => {
            violations.push(number_violation(field));
            None
        }
    }
}

fn number_violation(field: Field) -> Violation {
    Violation::new(field, format!("{} must be a valid number", field.label()))
}

fn percent_violation(field: Field) -> Violation {
    Violation::new(field, format!("{} must be between 0 and 100", field.label()))
}

fn name_ok(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() >= MIN_TEXT_LENGTH
        && trimmed
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace())
}

fn age_ok(age: i64) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&age)
}

fn email_ok(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

fn phone_ok(phone: &str) -> bool {
    phone.chars().count() >= MIN_PHONE_LENGTH
        && PHONE_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(phone))
}

fn course_ok(course: &str) -> bool {
    course.trim().chars().count() >= MIN_TEXT_LENGTH
}

fn percent_ok(value: f64) -> bool {
    (MIN_PERCENT..=MAX_PERCENT).contains(&value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> StudentInput {
        StudentInput::default()
            .with(Field::Name, "Aarav Sharma")
            .with(Field::Age, "20")
            .with(Field::Grade, "A")
            .with(Field::Email, "aarav.sharma@university.edu")
            .with(Field::Performance, "92")
            .with(Field::Phone, "+91 9876543210")
            .with(Field::Course, "Computer Science")
            .with(Field::Department, "Engineering")
            .with(Field::Attendance, "96.5")
    }

    fn fields(violations: &[Violation]) -> Vec<Field> {
        violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn valid_input_has_no_violations() {
        assert!(Validator::validate_input(&valid_input()).is_empty());
    }

    #[test]
    fn collects_every_violation() {
        let input = valid_input()
            .with(Field::Name, "A1")
            .with(Field::Age, "12")
            .with(Field::Email, "not-an-email")
            .with(Field::Grade, "E");

        let violations = Validator::validate_input(&input);
        assert_eq!(
            fields(&violations),
            vec![Field::Name, Field::Age, Field::Grade, Field::Email]
        );
    }

    #[test]
    fn unparsable_numbers_get_dedicated_message() {
        let input = valid_input()
            .with(Field::Age, "twenty")
            .with(Field::Performance, "lots")
            .with(Field::Attendance, "?");

        let messages: Vec<String> = Validator::validate_input(&input)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Age must be a valid number",
                "Performance must be a valid number",
                "Attendance must be a valid number",
            ]
        );
    }

    #[test]
    fn percent_bounds_are_inclusive() {
        let edge = valid_input()
            .with(Field::Performance, "100")
            .with(Field::Attendance, "0");
        assert!(Validator::validate_input(&edge).is_empty());

        let over = valid_input().with(Field::Performance, "100.01");
        assert_eq!(fields(&Validator::validate_input(&over)), vec![Field::Performance]);

        let nan = valid_input().with(Field::Attendance, "NaN");
        assert_eq!(fields(&Validator::validate_input(&nan)), vec![Field::Attendance]);
    }

    #[test]
    fn age_bounds_are_inclusive() {
        for age in ["15", "70"] {
            let input = valid_input().with(Field::Age, age);
            assert!(Validator::validate_input(&input).is_empty(), "age {age}");
        }
        for age in ["14", "71", "-3"] {
            let input = valid_input().with(Field::Age, age);
            assert_eq!(fields(&Validator::validate_input(&input)), vec![Field::Age]);
        }
    }

    #[test]
    fn phone_is_optional_but_checked_when_present() {
        let mut input = valid_input();
        input.phone = None;
        assert!(Validator::validate_input(&input).is_empty());

        let short = valid_input().with(Field::Phone, "12345");
        assert_eq!(fields(&Validator::validate_input(&short)), vec![Field::Phone]);

        let letters = valid_input().with(Field::Phone, "call me maybe");
        assert_eq!(fields(&Validator::validate_input(&letters)), vec![Field::Phone]);

        let punctuated = valid_input().with(Field::Phone, "(555) 123-4567");
        assert!(Validator::validate_input(&punctuated).is_empty());
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let violations = Validator::validate_input(&StudentInput::default());
        assert_eq!(
            fields(&violations),
            vec![
                Field::Name,
                Field::Age,
                Field::Grade,
                Field::Email,
                Field::Performance,
                Field::Course
            ]
        );
        assert_eq!(violations[0].message, "Name is required");
    }

    #[test]
    fn future_enrollment_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let input = valid_input().with(Field::EnrollmentDate, "2024-03-02");
        let violations = Validator::check_input(&input, today).expect_err("future date");
        assert_eq!(fields(&violations), vec![Field::EnrollmentDate]);

        let garbled = valid_input().with(Field::EnrollmentDate, "03/01/2024");
        let violations = Validator::check_input(&garbled, today).expect_err("bad format");
        assert_eq!(violations[0].message, DATE_FORMAT_MESSAGE);
    }

    #[test]
    fn into_student_applies_defaults() {
        let mut input = valid_input();
        input.department = None;
        input.attendance = None;
        input.phone = Some("   ".to_string());

        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("timestamp");
        let student = input.into_student("STU001".to_string(), now).expect("valid");

        assert_eq!(student.department, "General");
        assert!((student.attendance - 95.0).abs() < f64::EPSILON);
        assert_eq!(student.phone, None);
        assert_eq!(student.enrollment_date, now.date());
        assert_eq!(student.last_updated, now);
        assert!(student.activity_log.is_empty());
    }

    #[test]
    fn typed_record_checks_mirror_text_rules() {
        let now = chrono::Local::now().naive_local();
        let mut student = valid_input()
            .into_student("STU001".to_string(), now)
            .expect("valid");
        assert!(Validator::validate_student(&student).is_empty());

        student.age = 90;
        student.performance = 120.0;
        student.department = String::new();
        let violations = Validator::validate_student(&student);
        assert_eq!(
            fields(&violations),
            vec![Field::Age, Field::Performance, Field::Department]
        );
    }

    #[test]
    fn json_numbers_accepted_as_text() {
        let input: StudentInput =
            serde_json::from_str(r#"{"name":"Priya Patel","age":22,"performance":78.5}"#)
                .expect("deserialize");
        assert_eq!(input.age.as_deref(), Some("22"));
        assert_eq!(input.performance.as_deref(), Some("78.5"));
        assert_eq!(input.grade, None);
    }
}
