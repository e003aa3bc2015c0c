//! # Statistics Cache
//!
//! A single-entry TTL cache in front of `Statistics::compute`.
//!
//! The owner invalidates the entry after every successful store mutation,
//! so a hit is always a result computed from the current snapshot (or, at
//! worst, computed before the last invalidation and still within the TTL).

use super::Statistics;
use crate::primitives::STATS_CACHE_TTL;
use crate::Student;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A cached statistics result and when it was computed.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<Statistics>,
    pub computed_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.computed_at.elapsed() < ttl
    }
}

/// Statistics engine with a time-bounded result cache.
///
/// Reads go through `&self`; the entry sits behind a mutex.
#[derive(Debug)]
pub struct StatisticsEngine {
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new(STATS_CACHE_TTL)
    }
}

impl StatisticsEngine {
    /// Create an engine whose cached results live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached statistics if fresh, otherwise compute and cache.
    pub fn get_or_compute(
        &self,
        students: &[Student],
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Arc<Statistics> {
        let mut guard = self.entry.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = guard.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            tracing::debug!("statistics cache hit");
            return Arc::clone(&entry.value);
        }

        let value = Arc::new(Statistics::compute(students, today, now));
        tracing::debug!(records = students.len(), "statistics recomputed");
        *guard = Some(CacheEntry {
            value: Arc::clone(&value),
            computed_at: Instant::now(),
        });
        value
    }

    /// Drop the cached entry.
    pub fn invalidate(&self) {
        let mut guard = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Check if a fresh entry is cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|e| e.is_fresh(self.ttl))
    }
}

// =============================================================================
// TESTS
// =============================================================================
