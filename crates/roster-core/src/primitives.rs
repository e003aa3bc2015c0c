//! # Registry Primitives
//!
//! Hardcoded constants for the Roster CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Bounds here are the single source of truth for the validator, the
//! derived buckets and the statistics engine.

use std::time::Duration;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Prefix of every store-generated student id.
pub const ID_PREFIX: &str = "STU";

/// Minimum digit count after the prefix (`STU001`). Larger numbers widen.
pub const ID_DIGITS: usize = 3;

/// Highest sequence number an id may carry. Its successor must still be
/// representable so the next allocated id is always fresh.
pub const MAX_ID_SEQ: u64 = u64::MAX - 1;

// =============================================================================
// FIELD BOUNDS
// =============================================================================

/// Youngest accepted age (inclusive).
pub const MIN_AGE: i64 = 15;

/// Oldest accepted age (inclusive).
pub const MAX_AGE: i64 = 70;

/// Lower bound for performance and attendance percentages.
pub const MIN_PERCENT: f64 = 0.0;

/// Upper bound for performance and attendance percentages.
pub const MAX_PERCENT: f64 = 100.0;

/// Minimum trimmed length for names and course titles.
pub const MIN_TEXT_LENGTH: usize = 2;

/// Minimum length of a phone number (digits and punctuation).
pub const MIN_PHONE_LENGTH: usize = 10;

/// Attendance assumed when input omits it.
pub const DEFAULT_ATTENDANCE: f64 = 95.0;

/// Department assumed when input omits it.
pub const DEFAULT_DEPARTMENT: &str = "General";

// =============================================================================
// BUCKET THRESHOLDS
// =============================================================================

/// Performance at or above this is "Excellent".
pub const PERFORMANCE_EXCELLENT: f64 = 90.0;
/// Performance at or above this is "Good".
pub const PERFORMANCE_GOOD: f64 = 75.0;
/// Performance at or above this is "Average"; it is also the pass mark.
pub const PERFORMANCE_AVERAGE: f64 = 60.0;

/// Attendance at or above this is "Excellent".
pub const ATTENDANCE_EXCELLENT: f64 = 95.0;
/// Attendance at or above this is "Good".
pub const ATTENDANCE_GOOD: f64 = 85.0;
/// Attendance at or above this is "Average".
pub const ATTENDANCE_AVERAGE: f64 = 75.0;

// =============================================================================
// STATISTICS
// =============================================================================

/// Window (days) that defines "recent" enrollment for the trend signal.
pub const TREND_WINDOW_DAYS: i64 = 30;

/// How long a computed statistics result may be served from cache.
pub const STATS_CACHE_TTL: Duration = Duration::from_secs(30);

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum number of data rows accepted by a single CSV import.
pub const MAX_IMPORT_ROWS: usize = 10_000;

/// Maximum size of a persisted JSON store document (64 MB).
///
/// Checked before parsing so a corrupted file cannot exhaust memory.
pub const MAX_STORE_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Render the id for a sequence number (`7` -> `STU007`).
#[must_use]
pub fn format_id(seq: u64) -> String {
    format!("{ID_PREFIX}{seq:0width$}", width = ID_DIGITS)
}

/// Extract the numeric suffix of a well-formed id.
///
/// Returns `None` for ids that do not carry the prefix or whose suffix is
/// not a plain decimal number.
#[must_use]
pub fn parse_id_seq(id: &str) -> Option<u64> {
    let digits = id.strip_prefix(ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether `id` leaves room for the store to allocate a later id.
///
/// Ids outside the `STU<digits>` scheme never advance the sequence and are
/// always allocatable.
#[must_use]
pub fn id_seq_in_range(id: &str) -> bool {
    let Some(digits) = id.strip_prefix(ID_PREFIX) else {
        return true;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    parse_id_seq(id).is_some_and(|seq| seq <= MAX_ID_SEQ)
}
