//! # Performance Analysis
//!
//! Numeric helpers shared by the statistics engine, and the uncached
//! performance analysis report.

use crate::primitives::{PERFORMANCE_AVERAGE, PERFORMANCE_EXCELLENT};
use crate::Student;
use serde::{Deserialize, Serialize};

/// Round to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for even counts, 0 when empty.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns 0 when there are fewer than two pairs, when either series is
/// constant, or when the result is not a finite number.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    if is_constant(xs) || is_constant(ys) {
        return 0.0;
    }

    let (mean_x, mean_y) = (mean(xs), mean(ys));
    let mut covariance = 0.0;
    let mut spread_x = 0.0;
    let mut spread_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        spread_x += dx * dx;
        spread_y += dy * dy;
    }

    let denominator = (spread_x * spread_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let r = covariance / denominator;
    if r.is_finite() { r.clamp(-1.0, 1.0) } else { 0.0 }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Percentage of `values` satisfying `predicate`, rounded to one decimal.
fn rate(values: &[f64], predicate: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let hits = values.iter().filter(|v| predicate(**v)).count();
    round1(hits as f64 * 100.0 / values.len() as f64)
}

// =============================================================================
// REPORT
// =============================================================================

/// Distribution summary of performance across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub total_students: usize,
    pub highest: f64,
    pub lowest: f64,
    pub median: f64,
    /// Percentage of students at or above the pass mark (60).
    pub pass_rate: f64,
    /// Percentage of students at or above 90.
    pub excellence_rate: f64,
    pub average_attendance: f64,
    /// Pearson correlation between performance and attendance.
    pub correlation: f64,
}

impl PerformanceAnalysis {
    /// Analyse `students`. An empty slice yields all zeros.
    #[must_use]
    pub fn compute(students: &[Student]) -> Self {
        let performance: Vec<f64> = students.iter().map(|s| s.performance).collect();
        let attendance: Vec<f64> = students.iter().map(|s| s.attendance).collect();

        let highest = performance.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let lowest = performance.iter().copied().reduce(f64::min).unwrap_or(0.0);

        Self {
            total_students: students.len(),
            highest,
            lowest,
            median: median(&performance),
            pass_rate: rate(&performance, |p| p >= PERFORMANCE_AVERAGE),
            excellence_rate: rate(&performance, |p| p >= PERFORMANCE_EXCELLENT),
            average_attendance: round1(mean(&attendance)),
            correlation: pearson(&performance, &attendance),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
