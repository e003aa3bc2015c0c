//! # Manager
//!
//! The public façade over the record store, query engine, statistics engine
//! and CSV transfer.
//!
//! Every successful mutation invalidates the statistics cache. A failed
//! mutation leaves both the store and the cache untouched.

use crate::export::{ImportReport, export_csv, plan_import};
use crate::mutation::StudentUpdate;
use crate::query::{self, Filter, StudentQuery};
use crate::statistics::{PerformanceAnalysis, Statistics, StatisticsEngine};
use crate::storage::StorageBackend;
use crate::store::RecordStore;
use crate::types::{Activity, local_now, local_today};
use crate::validator::StudentInput;
use crate::{RosterError, Student};
use std::sync::Arc;
use std::time::Duration;

/// Student registry façade.
#[derive(Debug)]
pub struct Manager {
    store: RecordStore,
    stats: StatisticsEngine,
}

impl Manager {
    /// Open a registry over `backend`, loading its records.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, RosterError> {
        Ok(Self {
            store: RecordStore::open(backend)?,
            stats: StatisticsEngine::default(),
        })
    }

    /// An empty, memory-only registry.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: RecordStore::in_memory(),
            stats: StatisticsEngine::default(),
        }
    }

    /// Replace the statistics cache with one using `ttl`.
    #[must_use]
    pub fn with_stats_ttl(mut self, ttl: Duration) -> Self {
        self.stats = StatisticsEngine::new(ttl);
        self
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Add a fully formed record.
    pub fn add(&mut self, student: Student) -> Result<Student, RosterError> {
        let added = self.store.add(student)?.clone();
        self.stats.invalidate();
        Ok(added)
    }

    /// Create a record from raw input with the next free id.
    pub fn register(&mut self, input: &StudentInput) -> Result<Student, RosterError> {
        let added = self.store.register(input, local_now())?.clone();
        self.stats.invalidate();
        Ok(added)
    }

    /// Apply a typed partial update.
    pub fn update(&mut self, id: &str, update: &StudentUpdate) -> Result<Student, RosterError> {
        let updated = self.store.update(id, update, local_now())?.clone();
        self.stats.invalidate();
        Ok(updated)
    }

    /// Apply a partial update given as `(field name, text value)` pairs.
    ///
    /// # Errors
    /// - `NotFound` if no record has `id`
    /// - `UnknownField` for a name outside the updatable set
    /// - `Validation` for unparsable or out-of-range values
    pub fn update_fields<I, K, V>(&mut self, id: &str, pairs: I) -> Result<Student, RosterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.get(id)?;
        let update = StudentUpdate::from_pairs(pairs)?;
        self.update(id, &update)
    }

    pub fn delete(&mut self, id: &str) -> Result<Student, RosterError> {
        let removed = self.store.delete(id)?;
        self.stats.invalidate();
        Ok(removed)
    }

    /// Delete every listed id that exists; returns the number removed.
    pub fn bulk_delete(&mut self, ids: &[String]) -> Result<usize, RosterError> {
        let removed = self.store.bulk_delete(ids)?;
        if removed > 0 {
            self.stats.invalidate();
        }
        Ok(removed)
    }

    /// Append an entry to a student's activity log.
    pub fn log_activity(
        &mut self,
        id: &str,
        kind: &str,
        description: &str,
    ) -> Result<Activity, RosterError> {
        let entry = self.store.log_activity(id, kind, description, local_now())?;
        self.stats.invalidate();
        Ok(entry)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Result<&Student, RosterError> {
        self.store
            .get(id)
            .ok_or_else(|| RosterError::NotFound(id.to_string()))
    }

    #[must_use]
    pub fn get_all(&self) -> &[Student] {
        self.store.all()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&Student> {
        query::search(self.store.all(), text)
    }

    #[must_use]
    pub fn filter(&self, filter: &Filter) -> Vec<&Student> {
        query::apply(self.store.all(), filter, local_today())
    }

    /// Run a chained query (text, filters, sort).
    #[must_use]
    pub fn query(&self, query: &StudentQuery) -> Vec<&Student> {
        query.run(self.store.all(), local_today())
    }

    #[must_use]
    pub fn next_id(&self) -> String {
        self.store.next_id()
    }

    #[must_use]
    pub fn backend_name(&self) -> String {
        self.store.backend_name()
    }

    // =========================================================================
    // STATISTICS
    // =========================================================================

    /// Aggregate statistics, served from cache while fresh.
    pub fn statistics(&self) -> Arc<Statistics> {
        self.stats
            .get_or_compute(self.store.all(), local_today(), local_now())
    }

    /// Performance spread, always computed from the current snapshot.
    #[must_use]
    pub fn performance_analysis(&self) -> PerformanceAnalysis {
        PerformanceAnalysis::compute(self.store.all())
    }

    /// Drop any cached statistics.
    pub fn clear_cache(&self) {
        self.stats.invalidate();
        tracing::info!("statistics cache cleared");
    }

    /// Check if a fresh statistics result is cached.
    #[must_use]
    pub fn is_stats_cached(&self) -> bool {
        self.stats.is_cached()
    }

    // =========================================================================
    // CSV TRANSFER
    // =========================================================================

    /// Export every record as CSV text.
    pub fn export_csv(&self) -> Result<String, RosterError> {
        export_csv(self.store.all())
    }

    /// Import CSV text; valid rows are committed together, invalid rows are
    /// reported in the returned `ImportReport`.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, RosterError> {
        let plan = plan_import(text, self.store.all(), self.store.high_water(), local_now())?;
        let imported = self.store.insert_batch(plan.accepted)?;
        if imported > 0 {
            self.stats.invalidate();
        }

        let report = ImportReport {
            imported,
            errors: plan.errors,
        };
        tracing::info!(
            imported,
            rejected = report.errors.len(),
            "csv import committed"
        );
        Ok(report)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::in_memory()
    }
}

// =============================================================================
// TESTS
// =============================================================================
