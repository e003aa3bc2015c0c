//! # redb-backed Record Storage
//!
//! A disk-backed student store using the redb embedded database.
//!
//! Each record is stored as postcard bytes under its position in the store,
//! so iteration order over the table is store order. A save rewrites the
//! whole table inside one write transaction: either every record of the new
//! snapshot is committed or the previous snapshot stays in place.

use super::StorageBackend;
use crate::formats::persistence::ensure_unique_ids;
use crate::{RosterError, Student};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for records: position(u64) -> postcard-serialized Student
const STUDENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("students");

fn io_err(e: impl std::fmt::Display) -> RosterError {
    RosterError::Persistence(e.to_string())
}

/// A backend that stores every record in a redb database file.
pub struct RedbBackend {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let db = Database::create(&path).map_err(io_err)?;

        // Initialize the table so the first load finds it.
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(STUDENTS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db, path })
    }
}

impl StorageBackend for RedbBackend {
    fn load(&self) -> Result<Vec<Student>, RosterError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(STUDENTS).map_err(io_err)?;

        let mut students = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            let student: Student = postcard::from_bytes(value.value())
                .map_err(|e| RosterError::Parse(format!("Corrupted student record: {}", e)))?;
            students.push(student);
        }

        ensure_unique_ids(&students)?;
        Ok(students)
    }

    fn save(&mut self, students: &[Student]) -> Result<(), RosterError> {
        // Serialize everything before the transaction opens.
        let encoded = students
            .iter()
            .map(|s| postcard::to_allocvec(s).map_err(io_err))
            .collect::<Result<Vec<_>, _>>()?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        write_txn.delete_table(STUDENTS).map_err(io_err)?;
        {
            let mut table = write_txn.open_table(STUDENTS).map_err(io_err)?;
            for (position, bytes) in (0u64..).zip(encoded.iter()) {
                table
                    .insert(position, bytes.as_slice())
                    .map_err(io_err)?;
            }
        }
        // Dropping an uncommitted transaction aborts it.
        write_txn.commit().map_err(io_err)?;

        tracing::debug!(records = students.len(), path = %self.path.display(), "redb snapshot committed");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redb:{}", self.path.display())
    }
}

// =============================================================================
// TESTS
// =============================================================================
