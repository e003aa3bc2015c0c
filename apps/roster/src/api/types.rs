//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use roster_core::primitives::{MAX_PERCENT, MIN_PERCENT};
use roster_core::{
    Activity, AttendanceBucket, Filter, Grade, ImportReport, PerformanceBucket, RosterError,
    SortKey, Student, StudentQuery, Violation,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// LIST QUERY PARAMETERS
// =============================================================================

/// Query string accepted by `GET /students`.
///
/// Every parameter is optional; the ones present combine by logical AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Free-text search over name, email, course, department and id.
    pub q: Option<String>,
    pub grade: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub min_performance: Option<f64>,
    pub max_performance: Option<f64>,
    /// Performance classification ("Excellent", "needs-improvement", ...).
    pub status: Option<String>,
    /// Attendance classification ("Excellent", "Poor", ...).
    pub attendance_status: Option<String>,
    pub course: Option<String>,
    pub department: Option<String>,
    /// Only students enrolled in the last N days.
    pub recent_days: Option<u32>,
    /// Sort key ("name", "performance", "enrollment_date", ...).
    pub sort: Option<String>,
    #[serde(default)]
    pub desc: bool,
}

impl ListParams {
    /// Build the structured query these parameters describe.
    ///
    /// # Errors
    /// `Parse` for an unknown grade, classification or sort key.
    pub fn to_query(&self) -> Result<StudentQuery, RosterError> {
        let mut query = StudentQuery::new();

        if let Some(text) = self.q.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.text(text);
        }
        if let Some(grade) = &self.grade {
            query = query.filter(Filter::Grade(grade.parse::<Grade>()?));
        }
        if self.min_age.is_some() || self.max_age.is_some() {
            query = query.filter(Filter::AgeRange {
                min: self.min_age.unwrap_or(0),
                max: self.max_age.unwrap_or(u32::MAX),
            });
        }
        if self.min_performance.is_some() || self.max_performance.is_some() {
            query = query.filter(Filter::PerformanceRange {
                min: self.min_performance.unwrap_or(MIN_PERCENT),
                max: self.max_performance.unwrap_or(MAX_PERCENT),
            });
        }
        if let Some(status) = &self.status {
            query = query.filter(Filter::PerformanceBucket(status.parse::<PerformanceBucket>()?));
        }
        if let Some(status) = &self.attendance_status {
            query = query.filter(Filter::AttendanceBucket(status.parse::<AttendanceBucket>()?));
        }
        if let Some(course) = &self.course {
            query = query.filter(Filter::Course(course.clone()));
        }
        if let Some(department) = &self.department {
            query = query.filter(Filter::Department(department.clone()));
        }
        if let Some(days) = self.recent_days {
            query = query.filter(Filter::EnrolledWithin { days });
        }
        if let Some(sort) = &self.sort {
            query = query.sort_by(sort.parse::<SortKey>()?, self.desc);
        }

        Ok(query)
    }
}

// =============================================================================
// STUDENT RESPONSES
// =============================================================================

/// Single-record response (get, create, update, delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResponse {
    pub success: bool,
    pub student: Option<Student>,
    pub error: Option<String>,
    /// Field-level failures when `error` is a validation failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl StudentResponse {
    #[must_use]
    pub fn success(student: Student) -> Self {
        Self {
            success: true,
            student: Some(student),
            error: None,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(err: &RosterError) -> Self {
        Self {
            success: false,
            student: None,
            error: Some(err.to_string()),
            violations: err.violations().to_vec(),
        }
    }
}

/// Record listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub success: bool,
    pub count: usize,
    pub students: Vec<Student>,
    pub error: Option<String>,
}

impl StudentListResponse {
    #[must_use]
    pub fn success(students: Vec<Student>) -> Self {
        Self {
            success: true,
            count: students.len(),
            students,
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            count: 0,
            students: Vec::new(),
            error: Some(message),
        }
    }
}

// =============================================================================
// BULK DELETE REQUEST/RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    /// Number of records actually removed; unknown ids are skipped.
    pub deleted: usize,
    pub error: Option<String>,
}

impl BulkDeleteResponse {
    #[must_use]
    pub fn success(deleted: usize) -> Self {
        Self {
            success: true,
            deleted,
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            deleted: 0,
            error: Some(message),
        }
    }
}

// =============================================================================
// ACTIVITY REQUEST/RESPONSE
// =============================================================================

/// Activity log entry request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub activity: Option<Activity>,
    pub error: Option<String>,
}

impl ActivityResponse {
    #[must_use]
    pub fn success(activity: Activity) -> Self {
        Self {
            success: true,
            activity: Some(activity),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            activity: None,
            error: Some(message),
        }
    }
}

// =============================================================================
// MISC RESPONSES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextIdResponse {
    pub next_id: String,
}

/// Acknowledgement for `POST /cache/clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub message: String,
}

/// Failure body for endpoints whose success body is not JSON (`/export`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: String) -> Self {
        Self {
            success: false,
            error: message,
        }
    }
}

// =============================================================================
// IMPORT RESPONSE
// =============================================================================

/// CSV import outcome. A partially successful import still reports
/// `success: true`; `errors` lists the rejected rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub errors: Vec<String>,
    pub message: String,
    pub error: Option<String>,
}

impl ImportResponse {
    #[must_use]
    pub fn from_report(report: &ImportReport) -> Self {
        Self {
            success: true,
            imported: report.imported,
            errors: report.error_strings(),
            message: report.summary(),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            imported: 0,
            errors: Vec::new(),
            message: String::new(),
            error: Some(message),
        }
    }
}
