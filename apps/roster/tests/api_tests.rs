//! Integration tests for the Roster HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{StatusCode, header};
use axum_test::TestServer;
use roster::api::{
    ActivityResponse, AppState, BulkDeleteResponse, CacheClearResponse, HealthResponse,
    ImportResponse, NextIdResponse, StudentListResponse, StudentResponse, create_router,
};
use roster_core::{Field, Manager, PerformanceAnalysis, Statistics};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a test server over an empty in-memory registry.
fn create_test_server() -> TestServer {
    let router = create_router(AppState::new(Manager::in_memory()));
    TestServer::new(router).unwrap()
}

fn student_body(name: &str, age: u32, grade: &str, performance: f64) -> Value {
    json!({
        "name": name,
        "age": age,
        "grade": grade,
        "email": format!("{}@university.edu", name.to_lowercase().replace(' ', ".")),
        "performance": performance,
        "course": "Computer Science",
        "department": "Engineering",
    })
}

/// Create a test server holding three students (STU001..STU003).
async fn create_populated_test_server() -> TestServer {
    let server = create_test_server();
    for body in [
        student_body("Aarav Sharma", 20, "A", 92.0),
        student_body("Priya Patel", 22, "C", 65.0),
        student_body("Rohan Kumar", 23, "F", 40.0),
    ] {
        server
            .post("/students")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);
    }
    server
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// CREATE / READ TESTS
// =============================================================================

#[tokio::test]
async fn test_create_allocates_sequential_ids() {
    let server = create_test_server();

    let response = server
        .post("/students")
        .json(&student_body("Aarav Sharma", 20, "A", 92.0))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: StudentResponse = response.json();
    assert!(body.success);
    let student = body.student.unwrap();
    assert_eq!(student.id, "STU001");
    assert!((student.attendance - 95.0).abs() < f64::EPSILON);

    let next: NextIdResponse = server.get("/next-id").await.json();
    assert_eq!(next.next_id, "STU002");
}

#[tokio::test]
async fn test_create_accepts_numbers_as_strings() {
    let server = create_test_server();

    let mut body = student_body("Aarav Sharma", 20, "A", 92.0);
    body["age"] = json!("20");
    body["performance"] = json!("92.5");

    let response = server.post("/students").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let created: StudentResponse = response.json();
    assert_eq!(created.student.unwrap().age, 20);
}

#[tokio::test]
async fn test_create_invalid_lists_every_violation() {
    let server = create_test_server();

    let response = server
        .post("/students")
        .json(&json!({
            "name": "A",
            "age": 12,
            "grade": "Z",
            "email": "not-an-email",
            "performance": 150,
            "course": "Physics",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: StudentResponse = response.json();
    assert!(!body.success);
    assert!(body.student.is_none());
    let fields: Vec<Field> = body.violations.iter().map(|v| v.field).collect();
    assert_eq!(
        fields,
        vec![
            Field::Name,
            Field::Age,
            Field::Grade,
            Field::Email,
            Field::Performance
        ]
    );

    let next: NextIdResponse = server.get("/next-id").await.json();
    assert_eq!(next.next_id, "STU001");
}

#[tokio::test]
async fn test_get_unknown_student_is_not_found() {
    let server = create_test_server();

    let response = server.get("/students/STU999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: StudentResponse = response.json();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("STU999"));
}

// =============================================================================
// LIST / QUERY TESTS
// =============================================================================

#[tokio::test]
async fn test_list_returns_store_order() {
    let server = create_populated_test_server().await;

    let body: StudentListResponse = server.get("/students").await.json();
    assert!(body.success);
    assert_eq!(body.count, 3);
    let ids: Vec<&str> = body.students.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["STU001", "STU002", "STU003"]);
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let server = create_populated_test_server().await;

    let response = server
        .get("/students")
        .add_query_param("min_performance", 50)
        .add_query_param("sort", "performance")
        .add_query_param("desc", true)
        .await;

    response.assert_status_ok();
    let body: StudentListResponse = response.json();
    let ids: Vec<&str> = body.students.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["STU001", "STU002"]);
}

#[tokio::test]
async fn test_list_search_and_status() {
    let server = create_populated_test_server().await;

    let found: StudentListResponse = server.get("/students?q=PRIYA").await.json();
    assert_eq!(found.count, 1);
    assert_eq!(found.students[0].name, "Priya Patel");

    let struggling: StudentListResponse = server
        .get("/students?status=needs-improvement")
        .await
        .json();
    assert_eq!(struggling.count, 1);
    assert_eq!(struggling.students[0].id, "STU003");
}

#[tokio::test]
async fn test_list_rejects_unknown_sort_key() {
    let server = create_populated_test_server().await;

    let response = server.get("/students?sort=shoe_size").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: StudentListResponse = response.json();
    assert!(!body.success);
    assert!(body.students.is_empty());
}

// =============================================================================
// UPDATE TESTS
// =============================================================================

#[tokio::test]
async fn test_patch_updates_named_fields() {
    let server = create_populated_test_server().await;

    let response = server
        .patch("/students/STU002")
        .json(&json!({ "grade": "B", "performance": 81, "phone": "+91 98765 43210" }))
        .await;

    response.assert_status_ok();
    let body: StudentResponse = response.json();
    let student = body.student.unwrap();
    assert_eq!(student.grade.as_str(), "B");
    assert!((student.performance - 81.0).abs() < f64::EPSILON);
    assert_eq!(student.phone.as_deref(), Some("+91 98765 43210"));

    let cleared: StudentResponse = server
        .patch("/students/STU002")
        .json(&json!({ "phone": null }))
        .await
        .json();
    assert!(cleared.student.unwrap().phone.is_none());
}

#[tokio::test]
async fn test_patch_unknown_field_is_rejected() {
    let server = create_populated_test_server().await;

    let response = server
        .patch("/students/STU001")
        .json(&json!({ "student_id": "STU777" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let fetched: StudentResponse = server.get("/students/STU001").await.json();
    assert_eq!(fetched.student.unwrap().id, "STU001");
}

#[tokio::test]
async fn test_patch_out_of_range_keeps_record() {
    let server = create_populated_test_server().await;

    let response = server
        .patch("/students/STU001")
        .json(&json!({ "age": 90 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: StudentResponse = response.json();
    assert_eq!(body.violations.len(), 1);
    assert_eq!(body.violations[0].field, Field::Age);

    let fetched: StudentResponse = server.get("/students/STU001").await.json();
    assert_eq!(fetched.student.unwrap().age, 20);
}

#[tokio::test]
async fn test_patch_unknown_student_is_not_found() {
    let server = create_test_server();

    let response = server
        .patch("/students/STU404")
        .json(&json!({ "grade": "A" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// DELETE TESTS
// =============================================================================

#[tokio::test]
async fn test_delete_does_not_recycle_ids() {
    let server = create_populated_test_server().await;

    let response = server.delete("/students/STU003").await;
    response.assert_status_ok();
    let body: StudentResponse = response.json();
    assert_eq!(body.student.unwrap().name, "Rohan Kumar");

    server
        .get("/students/STU003")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let next: NextIdResponse = server.get("/next-id").await.json();
    assert_eq!(next.next_id, "STU004");
}

#[tokio::test]
async fn test_bulk_delete_skips_unknown_ids() {
    let server = create_populated_test_server().await;

    let response = server
        .post("/students/bulk-delete")
        .json(&json!({ "student_ids": ["STU001", "STU404", "STU003"] }))
        .await;

    response.assert_status_ok();
    let body: BulkDeleteResponse = response.json();
    assert!(body.success);
    assert_eq!(body.deleted, 2);

    let remaining: StudentListResponse = server.get("/students").await.json();
    assert_eq!(remaining.count, 1);
    assert_eq!(remaining.students[0].id, "STU002");
}

// =============================================================================
// ACTIVITY TESTS
// =============================================================================

#[tokio::test]
async fn test_activity_log_appends_in_order() {
    let server = create_populated_test_server().await;

    for description in ["Lab report", "Midterm"] {
        let response = server
            .post("/students/STU001/activities")
            .json(&json!({ "type": "Assignment", "description": description }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    let body: StudentResponse = server.get("/students/STU001").await.json();
    let log = body.student.unwrap().activity_log;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].seq, 1);
    assert_eq!(log[1].description, "Midterm");
}

#[tokio::test]
async fn test_activity_blank_type_rejected() {
    let server = create_populated_test_server().await;

    let response = server
        .post("/students/STU001/activities")
        .json(&json!({ "type": "  ", "description": "Nothing" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ActivityResponse = response.json();
    assert!(!body.success);
}

// =============================================================================
// STATISTICS TESTS
// =============================================================================

#[tokio::test]
async fn test_statistics_distribution() {
    let server = create_populated_test_server().await;

    let response = server.get("/statistics").await;

    response.assert_status_ok();
    let raw: Value = response.json();
    assert_eq!(raw["performance_distribution"]["Excellent"], 1);
    assert_eq!(raw["performance_distribution"]["Good"], 0);
    assert_eq!(raw["performance_distribution"]["Average"], 1);
    assert_eq!(raw["performance_distribution"]["NeedsImprovement"], 1);

    let stats: Statistics = response.json();
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.top_performer.unwrap().student_id, "STU001");
}

#[tokio::test]
async fn test_statistics_empty_registry() {
    let server = create_test_server();

    let stats: Statistics = server.get("/statistics").await.json();
    assert_eq!(stats.total_students, 0);
    assert!(stats.average_performance.abs() < f64::EPSILON);
    assert!(stats.correlation.abs() < f64::EPSILON);
    assert!(stats.top_performer.is_none());
}

#[tokio::test]
async fn test_statistics_reflect_mutations() {
    let server = create_populated_test_server().await;

    let before: Statistics = server.get("/statistics").await.json();
    assert_eq!(before.total_students, 3);

    server.delete("/students/STU002").await.assert_status_ok();

    let after: Statistics = server.get("/statistics").await.json();
    assert_eq!(after.total_students, 2);
}

#[tokio::test]
async fn test_analysis_rates() {
    let server = create_populated_test_server().await;

    let analysis: PerformanceAnalysis = server.get("/analysis").await.json();
    assert_eq!(analysis.total_students, 3);
    assert!((analysis.pass_rate - 66.7).abs() < 1e-9);
    assert!((analysis.median - 65.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_cache_clear() {
    let server = create_populated_test_server().await;
    let _ = server.get("/statistics").await;

    let response = server.post("/cache/clear").await;

    response.assert_status_ok();
    let body: CacheClearResponse = response.json();
    assert!(body.success);
}

// =============================================================================
// CSV TESTS
// =============================================================================

#[tokio::test]
async fn test_export_is_csv_attachment() {
    let server = create_populated_test_server().await;

    let response = server.get("/export").await;

    response.assert_status_ok();
    let content_type = response.header(header::CONTENT_TYPE);
    assert!(content_type.to_str().unwrap().starts_with("text/csv"));
    let text = response.text();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("student_id,name,age,grade,email"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn test_import_partial_success() {
    let server = create_test_server();
    let csv = "name,age,grade,email,performance,course\n\
               Aarav Sharma,20,A,aarav.sharma@university.edu,92,Computer Science\n\
               Priya Patel,12,B,priya.patel@university.edu,78,Mechanical Engineering\n\
               Rohan Kumar,23,C,rohan.kumar@university.edu,68,Civil Engineering\n";

    let response = server
        .post("/import")
        .content_type("text/csv")
        .text(csv)
        .await;

    response.assert_status_ok();
    let body: ImportResponse = response.json();
    assert!(body.success);
    assert_eq!(body.imported, 2);
    assert_eq!(body.errors.len(), 1);
    assert!(body.errors[0].starts_with("Row 2:"));
    assert!(body.errors[0].contains("Age"));

    let listed: StudentListResponse = server.get("/students").await.json();
    let names: Vec<&str> = listed.students.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Aarav Sharma", "Rohan Kumar"]);
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let source = create_populated_test_server().await;
    let csv = source.get("/export").await.text();

    let target = create_test_server();
    let body: ImportResponse = target.post("/import").text(csv).await.json();
    assert_eq!(body.imported, 3);
    assert!(body.errors.is_empty());

    let next: NextIdResponse = target.get("/next-id").await.json();
    assert_eq!(next.next_id, "STU004");
}
