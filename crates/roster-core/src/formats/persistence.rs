//! # Persistence Format
//!
//! JSON document format for the persisted student store.
//!
//! File I/O lives in the storage backends; this module only converts
//! between records and bytes.
//!
//! Format: a JSON array of student objects, in store order, using the field
//! names of `Student`'s serde representation (`student_id`, `name`, ...,
//! `activity_log`). Field names are stable across save/load cycles.
//!
//! Size and duplicate-id checks run before any record reaches the store, so a
//! corrupted file is rejected as a whole rather than loaded partially.

use crate::primitives::MAX_STORE_PAYLOAD_SIZE;
use crate::{RosterError, Student};
use std::collections::HashSet;

/// Serialize records to a pretty-printed JSON array.
///
/// This is a pure transformation - no file I/O.
pub fn students_to_json(students: &[Student]) -> Result<Vec<u8>, RosterError> {
    serde_json::to_vec_pretty(students).map_err(|e| RosterError::Persistence(e.to_string()))
}

/// Deserialize records from a JSON array.
///
/// This is a pure transformation - no file I/O.
///
/// Validates, in order:
/// 1. Payload size (before parsing)
/// 2. JSON shape
/// 3. Id uniqueness across the document
///
/// An empty or whitespace-only payload is an empty store.
pub fn students_from_json(bytes: &[u8]) -> Result<Vec<Student>, RosterError> {
    if bytes.len() > MAX_STORE_PAYLOAD_SIZE {
        return Err(RosterError::Parse(format!(
            "Store size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_STORE_PAYLOAD_SIZE
        )));
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let students: Vec<Student> = serde_json::from_slice(bytes)
        .map_err(|e| RosterError::Parse(format!("Failed to read student store: {}", e)))?;

    ensure_unique_ids(&students)?;
    Ok(students)
}

/// Reject a record set that carries the same id twice.
pub(crate) fn ensure_unique_ids(students: &[Student]) -> Result<(), RosterError> {
    let mut seen = HashSet::with_capacity(students.len());
    for student in students {
        if !seen.insert(student.id.as_str()) {
            return Err(RosterError::DuplicateId(student.id.clone()));
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grade;
    use chrono::NaiveDate;

    fn student(id: &str) -> Student {
        let enrolled = NaiveDate::from_ymd_opt(2023, 9, 1).expect("date");
        Student {
            id: id.to_string(),
            name: "Neha Gupta".to_string(),
            age: 20,
            grade: Grade::A,
            email: "neha.gupta@university.edu".to_string(),
            performance: 95.0,
            phone: None,
            course: "Business Administration".to_string(),
            department: "Business".to_string(),
            attendance: 98.2,
            enrollment_date: enrolled,
            last_updated: enrolled.and_hms_opt(12, 0, 0).expect("time"),
            activity_log: Vec::new(),
        }
    }

    #[test]
    fn save_load_save_is_stable() {
        let records = vec![student("STU001"), student("STU002")];

        let bytes1 = students_to_json(&records).expect("serialize");
        let restored = students_from_json(&bytes1).expect("deserialize");
        let bytes2 = students_to_json(&restored).expect("serialize again");

        assert_eq!(restored, records);
        assert_eq!(bytes1, bytes2, "save -> load -> save must be identical");
    }

    #[test]
    fn field_names_are_stable() {
        let bytes = students_to_json(&[student("STU001")]).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        for key in [
            "\"student_id\"",
            "\"enrollment_date\"",
            "\"last_updated\"",
            "\"attendance\"",
            "\"activity_log\"",
        ] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[test]
    fn missing_attendance_defaults_on_load() {
        let json = r#"[{
            "student_id": "STU004", "name": "Ananya Singh", "age": 19, "grade": "C",
            "email": "ananya.singh@university.edu", "performance": 65.5, "phone": null,
            "course": "Biology", "department": "Life Sciences",
            "enrollment_date": "2023-09-01", "last_updated": "2023-09-01T10:00:00"
        }]"#;
        let records = students_from_json(json.as_bytes()).expect("deserialize");
        assert_eq!(records.len(), 1);
        assert!((records[0].attendance - 95.0).abs() < f64::EPSILON);
        assert!(records[0].activity_log.is_empty());
    }

    #[test]
    fn empty_payload_is_empty_store() {
        assert!(students_from_json(b"").expect("empty").is_empty());
        assert!(students_from_json(b"  \n").expect("blank").is_empty());
    }

    #[test]
    fn corrupted_payload_rejected() {
        assert!(matches!(
            students_from_json(b"[{\"student_id\": 1"),
            Err(RosterError::Parse(_))
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let bytes = students_to_json(&[student("STU001"), student("STU001")]).expect("serialize");
        assert!(matches!(
            students_from_json(&bytes),
            Err(RosterError::DuplicateId(id)) if id == "STU001"
        ));
    }
}
