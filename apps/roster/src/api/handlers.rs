//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Error variants map onto status codes in one place, [`status_for`].

use super::{
    AppState,
    types::{
        ActivityRequest, ActivityResponse, BulkDeleteRequest, BulkDeleteResponse,
        CacheClearResponse, ErrorResponse, HealthResponse, ImportResponse, ListParams,
        NextIdResponse, StudentListResponse, StudentResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use roster_core::{RosterError, StudentInput};
use serde_json::{Map, Value};

/// HTTP status for a core error.
#[must_use]
pub fn status_for(err: &RosterError) -> StatusCode {
    match err {
        RosterError::Validation(_) | RosterError::UnknownField(_) | RosterError::Parse(_) => {
            StatusCode::BAD_REQUEST
        }
        RosterError::NotFound(_) => StatusCode::NOT_FOUND,
        RosterError::DuplicateId(_) => StatusCode::CONFLICT,
        RosterError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STUDENT HANDLERS
// =============================================================================

/// List students, optionally searched, filtered and sorted.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => {
            return (
                status_for(&e),
                Json(StudentListResponse::error(e.to_string())),
            );
        }
    };

    let manager = state.manager.read().await;
    let students = manager.query(&query).into_iter().cloned().collect();
    (StatusCode::OK, Json(StudentListResponse::success(students)))
}

/// Fetch one student.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let manager = state.manager.read().await;
    match manager.get(&id) {
        Ok(student) => (
            StatusCode::OK,
            Json(StudentResponse::success(student.clone())),
        ),
        Err(e) => (status_for(&e), Json(StudentResponse::error(&e))),
    }
}

/// Register a student; the id is allocated by the registry.
pub async fn create_handler(
    State(state): State<AppState>,
    Json(input): Json<StudentInput>,
) -> impl IntoResponse {
    let mut manager = state.manager.write().await;
    match manager.register(&input) {
        Ok(student) => (StatusCode::CREATED, Json(StudentResponse::success(student))),
        Err(e) => {
            tracing::warn!("Create rejected: {}", e);
            (status_for(&e), Json(StudentResponse::error(&e)))
        }
    }
}

/// Partially update a student from a JSON object of field → value.
///
/// Strings, numbers and `null` are accepted; `null` or `""` clears the phone.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let pairs: Vec<(String, String)> = body
        .into_iter()
        .map(|(key, value)| (key, value_text(value)))
        .collect();

    let mut manager = state.manager.write().await;
    match manager.update_fields(&id, pairs) {
        Ok(student) => (StatusCode::OK, Json(StudentResponse::success(student))),
        Err(e) => (status_for(&e), Json(StudentResponse::error(&e))),
    }
}

/// Text form of a JSON value as the update parser expects it.
fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Delete one student, returning the removed record.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut manager = state.manager.write().await;
    match manager.delete(&id) {
        Ok(student) => (StatusCode::OK, Json(StudentResponse::success(student))),
        Err(e) => (status_for(&e), Json(StudentResponse::error(&e))),
    }
}

/// Delete several students at once; unknown ids are skipped.
pub async fn bulk_delete_handler(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> impl IntoResponse {
    let mut manager = state.manager.write().await;
    match manager.bulk_delete(&request.student_ids) {
        Ok(deleted) => (StatusCode::OK, Json(BulkDeleteResponse::success(deleted))),
        Err(e) => (status_for(&e), Json(BulkDeleteResponse::error(e.to_string()))),
    }
}

/// Append an activity to a student's log.
pub async fn activity_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ActivityRequest>,
) -> impl IntoResponse {
    let mut manager = state.manager.write().await;
    match manager.log_activity(&id, &request.kind, &request.description) {
        Ok(activity) => (
            StatusCode::CREATED,
            Json(ActivityResponse::success(activity)),
        ),
        Err(e) => (status_for(&e), Json(ActivityResponse::error(e.to_string()))),
    }
}

// =============================================================================
// REGISTRY HANDLERS
// =============================================================================

/// The id the next registration will receive.
pub async fn next_id_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = state.manager.read().await;
    Json(NextIdResponse {
        next_id: manager.next_id(),
    })
}

/// Aggregate statistics, served from the cache while fresh.
pub async fn statistics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = state.manager.read().await;
    let stats = manager.statistics();
    (StatusCode::OK, Json(stats.as_ref().clone()))
}

/// Performance spread and pass/excellence rates.
pub async fn analysis_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = state.manager.read().await;
    (StatusCode::OK, Json(manager.performance_analysis()))
}

/// Drop the cached statistics.
pub async fn cache_clear_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = state.manager.read().await;
    manager.clear_cache();
    Json(CacheClearResponse {
        success: true,
        message: "Statistics cache cleared".to_string(),
    })
}

// =============================================================================
// CSV HANDLERS
// =============================================================================

/// Export every student as a CSV attachment.
pub async fn export_handler(State(state): State<AppState>) -> Response {
    let manager = state.manager.read().await;
    match manager.export_csv() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"students.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (
            status_for(&e),
            Json(ErrorResponse::new(format!("Export failed: {}", e))),
        )
            .into_response(),
    }
}

/// Import students from a CSV request body.
///
/// Rejected rows are reported without failing the request; only a parse or
/// persistence failure of the whole document is an error.
pub async fn import_handler(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let mut manager = state.manager.write().await;
    match manager.import_csv(&body) {
        Ok(report) => (StatusCode::OK, Json(ImportResponse::from_report(&report))),
        Err(e) => (
            status_for(&e),
            Json(ImportResponse::error(format!("Import failed: {}", e))),
        ),
    }
}
