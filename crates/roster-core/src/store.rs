//! # Record Store
//!
//! The single owner of the live student set.
//!
//! ## Guarantees
//!
//! - Ids are unique across the live set and never reused: a high-water
//!   sequence number only ever grows, even when the highest id is deleted.
//! - Every visible record has passed `Validator::validate_student`.
//! - Every mutation is all-or-nothing. It runs through `transact`, which
//!   snapshots the set, applies the change, persists it, and restores the
//!   snapshot if any step fails. Memory never diverges from the backing.
//!
//! Mutations take `&mut self`; exclusivity is the caller's borrow.

use crate::formats::persistence::ensure_unique_ids;
use crate::mutation::StudentUpdate;
use crate::primitives::{format_id, id_seq_in_range, parse_id_seq};
use crate::storage::{MemoryBackend, StorageBackend};
use crate::types::Activity;
use crate::validator::{StudentInput, Validator};
use crate::{RosterError, Student};
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// The live, ordered student set bound to a storage backend.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Student>,
    backend: Box<dyn StorageBackend>,
    /// Highest id sequence number ever accepted by this store.
    high_water: u64,
}

impl RecordStore {
    /// Open a store over `backend`, loading its persisted records.
    ///
    /// # Errors
    /// - `Persistence` / `Parse` if the backing cannot be read
    /// - `DuplicateId` if the persisted set carries the same id twice
    /// - `Parse` naming the first persisted record that fails validation
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, RosterError> {
        let records = backend.load()?;
        ensure_unique_ids(&records)?;
        for student in &records {
            check_stored(student)?;
        }

        let high_water = records
            .iter()
            .filter_map(|s| parse_id_seq(&s.id))
            .max()
            .unwrap_or(0);

        tracing::info!(
            backend = %backend.describe(),
            records = records.len(),
            next_id = %format_id(high_water.saturating_add(1)),
            "record store opened"
        );

        Ok(Self {
            records,
            backend,
            high_water,
        })
    }

    /// An empty store backed by memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            backend: Box::new(MemoryBackend::new()),
            high_water: 0,
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Student> {
        self.records.iter().find(|s| s.id == id)
    }

    /// Every record, in store order.
    #[must_use]
    pub fn all(&self) -> &[Student] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next created record will receive.
    #[must_use]
    pub fn next_id(&self) -> String {
        format_id(self.high_water.saturating_add(1))
    }

    /// Highest id sequence number accepted so far.
    #[must_use]
    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    /// Description of the storage backend.
    #[must_use]
    pub fn backend_name(&self) -> String {
        self.backend.describe()
    }

    fn position(&self, id: &str) -> Result<usize, RosterError> {
        self.records
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| RosterError::NotFound(id.to_string()))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Append a fully formed record.
    ///
    /// # Errors
    /// - `Validation` if any field is out of bounds
    /// - `DuplicateId` if the id is already live
    /// - `Parse` if the id's sequence number leaves no successor
    /// - `Persistence` if the backend rejects the save (state unchanged)
    pub fn add(&mut self, student: Student) -> Result<&Student, RosterError> {
        let violations = Validator::validate_student(&student);
        if !violations.is_empty() {
            return Err(RosterError::Validation(violations));
        }
        check_id_range(&student.id)?;
        if self.get(&student.id).is_some() {
            return Err(RosterError::DuplicateId(student.id));
        }

        let index = self.records.len();
        let seq = parse_id_seq(&student.id);
        self.transact("add", move |records| {
            records.push(student);
            Ok(())
        })?;
        self.observe(seq);
        Ok(&self.records[index])
    }

    /// Validate raw input, assign the next id, and add the record.
    pub fn register(
        &mut self,
        input: &StudentInput,
        now: NaiveDateTime,
    ) -> Result<&Student, RosterError> {
        let student = input.into_student(self.next_id(), now)?;
        self.add(student)
    }

    /// Apply a partial update to the record with `id`.
    ///
    /// The patched copy is re-validated before anything changes; `last_updated`
    /// becomes `now`.
    pub fn update(
        &mut self,
        id: &str,
        update: &StudentUpdate,
        now: NaiveDateTime,
    ) -> Result<&Student, RosterError> {
        let index = self.position(id)?;

        let mut patched = self.records[index].clone();
        update.apply(&mut patched, now);
        let violations = Validator::validate_student(&patched);
        if !violations.is_empty() {
            return Err(RosterError::Validation(violations));
        }

        self.transact("update", move |records| {
            records[index] = patched;
            Ok(())
        })?;
        Ok(&self.records[index])
    }

    /// Remove the record with `id`, returning it.
    pub fn delete(&mut self, id: &str) -> Result<Student, RosterError> {
        let index = self.position(id)?;
        self.transact("delete", move |records| Ok(records.remove(index)))
    }

    /// Remove every record whose id is in `ids`; unknown ids are ignored.
    ///
    /// Returns the number removed. Removing nothing does not touch the backend.
    pub fn bulk_delete(&mut self, ids: &[String]) -> Result<usize, RosterError> {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let matching = self
            .records
            .iter()
            .filter(|s| targets.contains(s.id.as_str()))
            .count();
        if matching == 0 {
            return Ok(0);
        }

        self.transact("bulk_delete", |records| {
            records.retain(|s| !targets.contains(s.id.as_str()));
            Ok(matching)
        })
    }

    /// Append an activity entry to the record with `id`.
    ///
    /// # Errors
    /// - `NotFound` if no such record
    /// - `Parse` if `kind` or `description` is blank
    pub fn log_activity(
        &mut self,
        id: &str,
        kind: &str,
        description: &str,
        now: NaiveDateTime,
    ) -> Result<Activity, RosterError> {
        let index = self.position(id)?;
        let kind = kind.trim();
        let description = description.trim();
        if kind.is_empty() {
            return Err(RosterError::Parse("Activity type must not be empty".to_string()));
        }
        if description.is_empty() {
            return Err(RosterError::Parse(
                "Activity description must not be empty".to_string(),
            ));
        }

        self.transact("log_activity", move |records| {
            let student = &mut records[index];
            student.last_updated = now;
            Ok(student.push_activity(kind, description, now).clone())
        })
    }

    /// Append several validated records in one persisted step.
    ///
    /// Fails as a whole if any record is invalid or collides with a live id
    /// or another record of the batch.
    pub fn insert_batch(&mut self, students: Vec<Student>) -> Result<usize, RosterError> {
        if students.is_empty() {
            return Ok(0);
        }

        let mut seen: HashSet<&str> = self.records.iter().map(|s| s.id.as_str()).collect();
        for student in &students {
            let violations = Validator::validate_student(student);
            if !violations.is_empty() {
                return Err(RosterError::Validation(violations));
            }
            check_id_range(&student.id)?;
            if !seen.insert(student.id.as_str()) {
                return Err(RosterError::DuplicateId(student.id.clone()));
            }
        }

        let count = students.len();
        let seqs: Vec<Option<u64>> = students.iter().map(|s| parse_id_seq(&s.id)).collect();
        self.transact("insert_batch", move |records| {
            records.extend(students);
            Ok(())
        })?;
        for seq in seqs {
            self.observe(seq);
        }
        Ok(count)
    }

    /// Run `change` against the live set and persist the result.
    ///
    /// On any error the set is restored to its state before the call.
    fn transact<T>(
        &mut self,
        op: &'static str,
        change: impl FnOnce(&mut Vec<Student>) -> Result<T, RosterError>,
    ) -> Result<T, RosterError> {
        let snapshot = self.records.clone();

        let outcome = match change(&mut self.records) {
            Ok(value) => self.backend.save(&self.records).map(|()| value),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => {
                tracing::info!(op, records = self.records.len(), "store committed");
                Ok(value)
            }
            Err(e) => {
                self.records = snapshot;
                tracing::warn!(op, error = %e, "store mutation rolled back");
                Err(e)
            }
        }
    }

    fn observe(&mut self, seq: Option<u64>) {
        if let Some(seq) = seq {
            self.high_water = self.high_water.max(seq);
        }
    }
}

fn check_id_range(id: &str) -> Result<(), RosterError> {
    if id_seq_in_range(id) {
        Ok(())
    } else {
        Err(RosterError::Parse(format!(
            "Student ID {} is beyond the last allocatable id",
            id
        )))
    }
}

/// Reject a persisted record that could never have been written through the
/// store.
fn check_stored(student: &Student) -> Result<(), RosterError> {
    let violations = Validator::validate_student(student);
    if !violations.is_empty() {
        let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(RosterError::Parse(format!(
            "Stored record {} is invalid: {}",
            student.id,
            reasons.join("; ")
        )));
    }
    check_id_range(&student.id)
}

// =============================================================================
// TESTS
// =============================================================================
