//! # Storage Module
//!
//! Durable backing for the record store.
//!
//! A backend persists the full, ordered record set as one unit. The record
//! store calls `save` after every mutation and treats an error as "nothing
//! was written": it then restores its in-memory state, so memory and the
//! backing never diverge.
//!
//! ## Backends
//!
//! - `MemoryBackend`: volatile, for tests and throwaway sessions
//! - `JsonFileBackend`: a single pretty-printed JSON document, replaced atomically
//! - `RedbBackend`: a redb embedded database, rewritten in one ACID transaction

pub mod json_file;
pub mod redb_store;

pub use json_file::JsonFileBackend;
pub use redb_store::RedbBackend;

use crate::{RosterError, Student};
use std::fmt::Debug;

/// The persistence seam of the record store.
pub trait StorageBackend: Send + Sync + Debug {
    /// Load the persisted record set, in store order.
    ///
    /// A backing that does not exist yet is an empty store.
    fn load(&self) -> Result<Vec<Student>, RosterError>;

    /// Replace the persisted record set with `students`.
    ///
    /// Must be all-or-nothing: on `Err`, the previous contents remain.
    fn save(&mut self, students: &[Student]) -> Result<(), RosterError>;

    /// Short human-readable description ("memory", "json:/path", ...).
    fn describe(&self) -> String;
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// Volatile backend holding the last saved snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    snapshot: Vec<Student>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with records, as if previously saved.
    #[must_use]
    pub fn with_records(students: Vec<Student>) -> Self {
        Self { snapshot: students }
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<Student>, RosterError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, students: &[Student]) -> Result<(), RosterError> {
        self.snapshot = students.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_starts_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.load().expect("load").is_empty());
        assert_eq!(backend.describe(), "memory");
    }

    #[test]
    fn memory_backend_is_usable_as_trait_object() {
        let mut backend: Box<dyn StorageBackend> = Box::new(MemoryBackend::new());
        backend.save(&[]).expect("save");
        assert!(backend.load().expect("load").is_empty());
    }
}
