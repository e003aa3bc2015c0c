//! # Partial Updates
//!
//! The closed set of changes a caller may apply to an existing record.
//!
//! Field names arriving from outside (HTTP bodies, CLI `--set` pairs) are
//! mapped onto `Field`; anything else is rejected with
//! `RosterError::UnknownField` instead of being silently dropped or applied.
//! The id, `last_updated` and the activity log are never caller-writable.

use crate::primitives::{MAX_AGE, MIN_AGE};
use crate::validator::AGE_RANGE_MESSAGE;
use crate::{Field, Grade, RosterError, Student, Violation};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A partial update: one optional slot per updatable field.
///
/// `phone` is doubly optional: `Some(None)` clears the phone number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub grade: Option<Grade>,
    pub email: Option<String>,
    pub performance: Option<f64>,
    pub phone: Option<Option<String>>,
    pub course: Option<String>,
    pub department: Option<String>,
    pub attendance: Option<f64>,
    pub enrollment_date: Option<NaiveDate>,
}

impl StudentUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from caller-supplied `(field name, text value)` pairs.
    ///
    /// # Errors
    /// - `UnknownField` for the first name outside the updatable set
    /// - `Validation` listing every value that could not be parsed
    ///
    /// Ages are range-checked here, since a negative or oversized number
    /// has no `u32` slot. Other range checks happen later, against the
    /// patched record.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut update = Self::new();
        let mut violations = Vec::new();

        for (key, value) in pairs {
            let field: Field = key.as_ref().trim().parse()?;
            let value = value.as_ref().trim();
            if let Err(violation) = update.set_text(field, value) {
                violations.push(violation);
            }
        }

        if violations.is_empty() {
            Ok(update)
        } else {
            Err(RosterError::Validation(violations))
        }
    }

    /// Parse `value` into the slot for `field`.
    fn set_text(&mut self, field: Field, value: &str) -> Result<(), Violation> {
        let not_a_number = || Violation::new(field, format!("{} must be a valid number", field.label()));

        match field {
            Field::Name => self.name = Some(value.to_string()),
            Field::Age => {
                let age: i64 = value.parse().map_err(|_| not_a_number())?;
                let out_of_range = || Violation::new(field, AGE_RANGE_MESSAGE);
                if !(MIN_AGE..=MAX_AGE).contains(&age) {
                    return Err(out_of_range());
                }
                self.age = Some(u32::try_from(age).map_err(|_| out_of_range())?);
            }
            Field::Grade => {
                self.grade = Some(value.parse().map_err(|_| {
                    Violation::new(field, "Grade must be one of: A, B, C, D, F")
                })?);
            }
            Field::Email => self.email = Some(value.to_string()),
            Field::Performance => {
                self.performance = Some(value.parse().map_err(|_| not_a_number())?);
            }
            Field::Phone => {
                self.phone = Some(if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                });
            }
            Field::Course => self.course = Some(value.to_string()),
            Field::Department => self.department = Some(value.to_string()),
            Field::Attendance => {
                self.attendance = Some(value.parse().map_err(|_| not_a_number())?);
            }
            Field::EnrollmentDate => {
                self.enrollment_date =
                    Some(NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                        Violation::new(field, "Enrollment date must be a valid YYYY-MM-DD date")
                    })?);
            }
        }
        Ok(())
    }

    /// Check if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// The fields this update touches, in canonical order.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<Field> {
        let present = [
            self.name.is_some(),
            self.age.is_some(),
            self.grade.is_some(),
            self.email.is_some(),
            self.performance.is_some(),
            self.phone.is_some(),
            self.course.is_some(),
            self.department.is_some(),
            self.attendance.is_some(),
            self.enrollment_date.is_some(),
        ];
        Field::ALL
            .iter()
            .zip(present)
            .filter_map(|(field, set)| set.then_some(*field))
            .collect()
    }

    /// Apply this update to `student` and stamp `last_updated = now`.
    ///
    /// Does not validate; the store re-validates the patched copy before
    /// committing it.
    pub fn apply(&self, student: &mut Student, now: NaiveDateTime) {
        if let Some(name) = &self.name {
            student.name = name.trim().to_string();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(grade) = self.grade {
            student.grade = grade;
        }
        if let Some(email) = &self.email {
            student.email = email.trim().to_string();
        }
        if let Some(performance) = self.performance {
            student.performance = performance;
        }
        if let Some(phone) = &self.phone {
            student.phone = phone.clone();
        }
        if let Some(course) = &self.course {
            student.course = course.trim().to_string();
        }
        if let Some(department) = &self.department {
            student.department = department.trim().to_string();
        }
        if let Some(attendance) = self.attendance {
            student.attendance = attendance;
        }
        if let Some(date) = self.enrollment_date {
            student.enrollment_date = date;
        }
        student.last_updated = now;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Student {
        let enrolled = NaiveDate::from_ymd_opt(2023, 9, 1).expect("date");
        Student {
            id: "STU001".to_string(),
            name: "Aarav Sharma".to_string(),
            age: 20,
            grade: Grade::A,
            email: "aarav.sharma@university.edu".to_string(),
            performance: 92.0,
            phone: Some("+91 9876543210".to_string()),
            course: "Computer Science".to_string(),
            department: "Engineering".to_string(),
            attendance: 96.5,
            enrollment_date: enrolled,
            last_updated: enrolled.and_hms_opt(8, 0, 0).expect("time"),
            activity_log: Vec::new(),
        }
    }

    #[test]
    fn from_pairs_parses_known_fields() {
        let update = StudentUpdate::from_pairs([
            ("age", "21"),
            ("grade", "b"),
            ("performance", "81.5"),
            ("phone", ""),
        ])
        .expect("valid pairs");

        assert_eq!(update.age, Some(21));
        assert_eq!(update.grade, Some(Grade::B));
        assert_eq!(update.performance, Some(81.5));
        assert_eq!(update.phone, Some(None));
        assert_eq!(
            update.changed_fields(),
            vec![Field::Age, Field::Grade, Field::Performance, Field::Phone]
        );
    }

    #[test]
    fn from_pairs_rejects_unknown_and_readonly_fields() {
        for key in ["nickname", "student_id", "last_updated", "activity_log"] {
            let result = StudentUpdate::from_pairs([(key, "x")]);
            assert!(
                matches!(result, Err(RosterError::UnknownField(ref name)) if name == key),
                "{key} must be rejected"
            );
        }
    }

    #[test]
    fn from_pairs_collects_parse_failures() {
        let result = StudentUpdate::from_pairs([("age", "old"), ("attendance", "high")]);
        let Err(RosterError::Validation(violations)) = result else {
            unreachable!("expected validation failure");
        };
        let fields: Vec<Field> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec![Field::Age, Field::Attendance]);
    }

    #[test]
    fn from_pairs_reports_age_range_like_registration() {
        for raw in ["-3", "9", "71", "99999999999"] {
            let Err(RosterError::Validation(violations)) = StudentUpdate::from_pairs([("age", raw)])
            else {
                unreachable!("age {raw} must be rejected");
            };
            assert_eq!(violations[0].message, "Age must be between 15 and 70 years");
        }
        let update = StudentUpdate::from_pairs([("age", "70")]).expect("upper bound");
        assert_eq!(update.age, Some(70));
    }

    #[test]
    fn apply_touches_only_named_fields() {
        let mut student = sample();
        let before = student.clone();
        let now = NaiveDate::from_ymd_opt(2024, 1, 5)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("time");

        let update = StudentUpdate {
            course: Some("  Data Science ".to_string()),
            ..StudentUpdate::new()
        };
        update.apply(&mut student, now);

        assert_eq!(student.course, "Data Science");
        assert_eq!(student.last_updated, now);
        assert_eq!(student.name, before.name);
        assert_eq!(student.id, before.id);
        assert_eq!(student.performance, before.performance);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(StudentUpdate::new().is_empty());
        let update = StudentUpdate {
            attendance: Some(80.0),
            ..StudentUpdate::new()
        };
        assert!(!update.is_empty());
    }
}
