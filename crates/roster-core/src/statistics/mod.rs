//! # Statistics Module
//!
//! Aggregate views over the record set.
//!
//! - `Statistics`: means, distributions, trend and standouts (cacheable)
//! - `PerformanceAnalysis`: spread of performance scores (always fresh)
//! - `StatisticsEngine`: TTL cache in front of `Statistics::compute`
//!
//! All computations are pure functions of the snapshot and the clock values
//! passed in.

pub mod analysis;
pub mod cache;

pub use analysis::{PerformanceAnalysis, mean, median, pearson, round1};
pub use cache::{CacheEntry, StatisticsEngine};

use crate::primitives::TREND_WINDOW_DAYS;
use crate::{AttendanceBucket, Grade, PerformanceBucket, Student};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of recent performance relative to the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// A record singled out by an argmax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standout {
    pub student_id: String,
    pub name: String,
    pub value: f64,
}

impl Standout {
    fn of(student: &Student, value: f64) -> Self {
        Self {
            student_id: student.id.clone(),
            name: student.name.clone(),
            value,
        }
    }
}

/// Aggregate statistics for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_students: usize,
    pub average_age: f64,
    pub average_performance: f64,
    pub average_attendance: f64,
    /// Every grade, including those with zero students.
    pub grade_distribution: BTreeMap<Grade, usize>,
    /// Every performance bucket, including empty ones.
    pub performance_distribution: BTreeMap<PerformanceBucket, usize>,
    /// Every attendance bucket, including empty ones.
    pub attendance_distribution: BTreeMap<AttendanceBucket, usize>,
    /// Only courses that occur.
    pub course_distribution: BTreeMap<String, usize>,
    /// Only departments that occur.
    pub department_distribution: BTreeMap<String, usize>,
    pub trend: Trend,
    /// Students enrolled within the trend window.
    pub recent_additions: usize,
    pub top_performer: Option<Standout>,
    pub most_attended: Option<Standout>,
    /// Pearson correlation between performance and attendance.
    pub correlation: f64,
    pub computed_at: NaiveDateTime,
}

impl Statistics {
    /// Compute statistics for `students` as of `today`, stamped `now`.
    #[must_use]
    pub fn compute(students: &[Student], today: NaiveDate, now: NaiveDateTime) -> Self {
        let ages: Vec<f64> = students.iter().map(|s| f64::from(s.age)).collect();
        let performance: Vec<f64> = students.iter().map(|s| s.performance).collect();
        let attendance: Vec<f64> = students.iter().map(|s| s.attendance).collect();

        let mut grade_distribution: BTreeMap<Grade, usize> =
            Grade::ALL.iter().map(|g| (*g, 0)).collect();
        let mut performance_distribution: BTreeMap<PerformanceBucket, usize> =
            PerformanceBucket::ALL.iter().map(|b| (*b, 0)).collect();
        let mut attendance_distribution: BTreeMap<AttendanceBucket, usize> =
            AttendanceBucket::ALL.iter().map(|b| (*b, 0)).collect();
        let mut course_distribution = BTreeMap::new();
        let mut department_distribution = BTreeMap::new();

        for student in students {
            *grade_distribution.entry(student.grade).or_insert(0) += 1;
            *performance_distribution
                .entry(student.performance_bucket())
                .or_insert(0) += 1;
            *attendance_distribution
                .entry(student.attendance_bucket())
                .or_insert(0) += 1;
            *course_distribution.entry(student.course.clone()).or_insert(0) += 1;
            *department_distribution
                .entry(student.department.clone())
                .or_insert(0) += 1;
        }

        let cutoff = today
            .checked_sub_days(Days::new(TREND_WINDOW_DAYS.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN);
        let recent: Vec<f64> = students
            .iter()
            .filter(|s| s.enrollment_date >= cutoff)
            .map(|s| s.performance)
            .collect();

        Self {
            total_students: students.len(),
            average_age: round1(mean(&ages)),
            average_performance: round1(mean(&performance)),
            average_attendance: round1(mean(&attendance)),
            grade_distribution,
            performance_distribution,
            attendance_distribution,
            course_distribution,
            department_distribution,
            trend: trend(&recent, &performance),
            recent_additions: recent.len(),
            top_performer: argmax(students, |s| s.performance),
            most_attended: argmax(students, |s| s.attendance),
            correlation: pearson(&performance, &attendance),
            computed_at: now,
        }
    }
}

/// Compare the recent mean against the overall mean.
fn trend(recent: &[f64], overall: &[f64]) -> Trend {
    if recent.is_empty() {
        return Trend::Stable;
    }
    let recent_mean = mean(recent);
    let overall_mean = mean(overall);
    if recent_mean > overall_mean {
        Trend::Improving
    } else if recent_mean < overall_mean {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// First record with the strictly greatest key.
fn argmax(students: &[Student], key: impl Fn(&Student) -> f64) -> Option<Standout> {
    let mut best: Option<(&Student, f64)> = None;
    for student in students {
        let value = key(student);
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((student, value)),
        }
    }
    best.map(|(student, value)| Standout::of(student, value))
}

// =============================================================================
// TESTS
// =============================================================================
