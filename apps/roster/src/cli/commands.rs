//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens the configured store, performs one operation and
//! prints either human-readable text or, with `--json-mode`, a JSON document.

use crate::api::{self, AppState, ListParams};
use crate::config::RosterConfig;
use roster_core::{RosterError, Student, StudentInput};
use serde_json::json;
use std::path::Path;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum CSV file size accepted by `import` (50 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), RosterError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        RosterError::Persistence(format!(
            "Cannot read file metadata '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > max_size {
        return Err(RosterError::Parse(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Print a JSON value on stdout.
fn print_json(value: &serde_json::Value) -> Result<(), RosterError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| RosterError::Parse(format!("JSON serialization failed: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// One-line summary of a student.
fn summary_line(student: &Student) -> String {
    format!(
        "{:<8} {:<24} {:>3}  {}  {:>5.1}  {:>5.1}%  {}",
        student.id,
        student.name,
        student.age,
        student.grade,
        student.performance,
        student.attendance,
        student.course
    )
}

fn print_student(student: &Student) {
    println!("Student {}", student.id);
    println!("  Name:        {}", student.name);
    println!("  Age:         {}", student.age);
    println!("  Grade:       {}", student.grade);
    println!("  Email:       {}", student.email);
    println!(
        "  Phone:       {}",
        student.phone.as_deref().unwrap_or("-")
    );
    println!("  Course:      {}", student.course);
    println!("  Department:  {}", student.department);
    println!(
        "  Performance: {:.1} ({})",
        student.performance,
        student.performance_bucket()
    );
    println!(
        "  Attendance:  {:.1}% ({})",
        student.attendance,
        student.attendance_bucket()
    );
    println!("  Enrolled:    {}", student.enrollment_date);
    println!("  Updated:     {}", student.last_updated);
    if !student.activity_log.is_empty() {
        println!("  Activity:");
        for entry in &student.activity_log {
            println!(
                "    #{} {} [{}] {}",
                entry.seq, entry.timestamp, entry.kind, entry.description
            );
        }
    }
}

/// Print the violation list of a validation failure before returning it.
fn report_failure(err: RosterError, json_mode: bool) -> Result<(), RosterError> {
    if json_mode {
        print_json(&json!({
            "success": false,
            "error": err.to_string(),
            "violations": err.violations(),
        }))?;
    } else {
        for violation in err.violations() {
            eprintln!("  - {}: {}", violation.field, violation.message);
        }
    }
    Err(err)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &RosterConfig) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let addr = config.bind_addr();

    println!("Roster Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", addr);
    println!("  Backend:  {}", manager.backend_name());
    println!("  Students: {}", manager.len());
    println!("  Stats TTL: {}s", config.stats_ttl_secs);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(manager).with_cors_origins(config.cors_origins.clone());
    api::run_server(&addr, state).await
}

// =============================================================================
// READ COMMANDS
// =============================================================================

/// List students matching the given parameters.
pub fn cmd_list(
    config: &RosterConfig,
    json_mode: bool,
    params: &ListParams,
) -> Result<(), RosterError> {
    let query = params.to_query()?;
    let manager = config.open_manager()?;
    let students = manager.query(&query);

    if json_mode {
        return print_json(&json!({
            "count": students.len(),
            "students": students,
        }));
    }

    if students.is_empty() {
        println!("No students found.");
        return Ok(());
    }
    for student in &students {
        println!("{}", summary_line(student));
    }
    println!();
    println!("{} of {} students", students.len(), manager.len());
    Ok(())
}

/// Show one student in full.
pub fn cmd_show(config: &RosterConfig, json_mode: bool, id: &str) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let student = manager.get(id)?;

    if json_mode {
        print_json(&json!(student))
    } else {
        print_student(student);
        Ok(())
    }
}

/// Show the id the next registration will receive.
pub fn cmd_next_id(config: &RosterConfig, json_mode: bool) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let next_id = manager.next_id();

    if json_mode {
        print_json(&json!({ "next_id": next_id }))
    } else {
        println!("{}", next_id);
        Ok(())
    }
}

// =============================================================================
// MUTATING COMMANDS
// =============================================================================

/// Register a student from command-line fields.
pub fn cmd_add(
    config: &RosterConfig,
    json_mode: bool,
    input: &StudentInput,
) -> Result<(), RosterError> {
    let mut manager = config.open_manager()?;
    let student = match manager.register(input) {
        Ok(s) => s,
        Err(e) => return report_failure(e, json_mode),
    };

    if json_mode {
        print_json(&json!({ "success": true, "student": student }))
    } else {
        println!("Added student {} ({})", student.id, student.name);
        Ok(())
    }
}

/// Apply `field=value` assignments to a student.
pub fn cmd_update(
    config: &RosterConfig,
    json_mode: bool,
    id: &str,
    assignments: Vec<(String, String)>,
) -> Result<(), RosterError> {
    let mut manager = config.open_manager()?;
    let student = match manager.update_fields(id, assignments) {
        Ok(s) => s,
        Err(e) => return report_failure(e, json_mode),
    };

    if json_mode {
        print_json(&json!({ "success": true, "student": student }))
    } else {
        println!("Updated student {}", student.id);
        Ok(())
    }
}

pub fn cmd_delete(config: &RosterConfig, json_mode: bool, id: &str) -> Result<(), RosterError> {
    let mut manager = config.open_manager()?;
    let removed = manager.delete(id)?;

    if json_mode {
        print_json(&json!({ "success": true, "student": removed }))
    } else {
        println!("Deleted student {} ({})", removed.id, removed.name);
        Ok(())
    }
}

pub fn cmd_bulk_delete(
    config: &RosterConfig,
    json_mode: bool,
    ids: &[String],
) -> Result<(), RosterError> {
    let mut manager = config.open_manager()?;
    let deleted = manager.bulk_delete(ids)?;

    if json_mode {
        print_json(&json!({ "success": true, "deleted": deleted }))
    } else {
        println!("Deleted {} of {} requested students", deleted, ids.len());
        Ok(())
    }
}

/// Append an activity to a student's log.
pub fn cmd_log(
    config: &RosterConfig,
    json_mode: bool,
    id: &str,
    kind: &str,
    description: &str,
) -> Result<(), RosterError> {
    let mut manager = config.open_manager()?;
    let activity = manager.log_activity(id, kind, description)?;

    if json_mode {
        print_json(&json!({ "success": true, "activity": activity }))
    } else {
        println!("Logged activity #{} for {}", activity.seq, id);
        Ok(())
    }
}

// =============================================================================
// STATISTICS COMMANDS
// =============================================================================

/// Print aggregate statistics.
pub fn cmd_stats(config: &RosterConfig, json_mode: bool) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let stats = manager.statistics();

    if json_mode {
        return print_json(&json!(stats.as_ref()));
    }

    println!("Roster Statistics");
    println!("=================");
    println!("Total students:      {}", stats.total_students);
    println!("Average age:         {:.1}", stats.average_age);
    println!("Average performance: {:.1}", stats.average_performance);
    println!("Average attendance:  {:.1}%", stats.average_attendance);
    println!(
        "Recent additions:    {} (trend: {:?})",
        stats.recent_additions, stats.trend
    );
    println!("Correlation:         {:.3}", stats.correlation);
    if let Some(top) = &stats.top_performer {
        println!("Top performer:       {} {} ({:.1})", top.student_id, top.name, top.value);
    }
    if let Some(best) = &stats.most_attended {
        println!("Best attendance:     {} {} ({:.1}%)", best.student_id, best.name, best.value);
    }

    println!();
    println!("Grades:");
    for (grade, count) in &stats.grade_distribution {
        println!("  {:<18} {}", grade, count);
    }
    println!("Performance:");
    for (bucket, count) in &stats.performance_distribution {
        println!("  {:<18} {}", bucket.label(), count);
    }
    println!("Attendance:");
    for (bucket, count) in &stats.attendance_distribution {
        println!("  {:<18} {}", bucket.label(), count);
    }
    println!("Courses:");
    for (course, count) in &stats.course_distribution {
        println!("  {:<18} {}", course, count);
    }
    println!("Departments:");
    for (department, count) in &stats.department_distribution {
        println!("  {:<18} {}", department, count);
    }
    Ok(())
}

/// Print the performance analysis.
pub fn cmd_analysis(config: &RosterConfig, json_mode: bool) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let analysis = manager.performance_analysis();

    if json_mode {
        return print_json(&json!(analysis));
    }

    println!("Performance Analysis");
    println!("====================");
    println!("Students:        {}", analysis.total_students);
    println!("Highest:         {:.1}", analysis.highest);
    println!("Lowest:          {:.1}", analysis.lowest);
    println!("Median:          {:.1}", analysis.median);
    println!("Pass rate:       {:.1}%", analysis.pass_rate);
    println!("Excellence rate: {:.1}%", analysis.excellence_rate);
    println!("Avg attendance:  {:.1}%", analysis.average_attendance);
    println!("Correlation:     {:.3}", analysis.correlation);
    Ok(())
}

// =============================================================================
// CSV COMMANDS
// =============================================================================

/// Export every student as CSV to a file or stdout.
pub fn cmd_export(
    config: &RosterConfig,
    json_mode: bool,
    output: Option<&Path>,
) -> Result<(), RosterError> {
    let manager = config.open_manager()?;
    let csv = manager.export_csv()?;

    let Some(path) = output else {
        print!("{}", csv);
        return Ok(());
    };

    std::fs::write(path, &csv).map_err(|e| {
        RosterError::Persistence(format!("Cannot write '{}': {}", path.display(), e))
    })?;

    if json_mode {
        print_json(&json!({
            "success": true,
            "exported": manager.len(),
            "path": path.display().to_string(),
        }))
    } else {
        println!("Exported {} students to {}", manager.len(), path.display());
        Ok(())
    }
}

/// Import students from a CSV file, reporting rejected rows.
pub fn cmd_import(config: &RosterConfig, json_mode: bool, input: &Path) -> Result<(), RosterError> {
    validate_file_size(input, MAX_IMPORT_FILE_SIZE)?;
    let text = std::fs::read_to_string(input).map_err(|e| {
        RosterError::Persistence(format!("Cannot read '{}': {}", input.display(), e))
    })?;

    let mut manager = config.open_manager()?;
    let report = manager.import_csv(&text)?;

    if json_mode {
        return print_json(&json!({
            "success": true,
            "imported": report.imported,
            "errors": report.error_strings(),
            "message": report.summary(),
        }));
    }

    println!("{}", report.summary());
    for line in report.error_strings() {
        println!("  {}", line);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
