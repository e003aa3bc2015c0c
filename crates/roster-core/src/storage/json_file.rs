//! # JSON File Backend
//!
//! Persists the record set as a single JSON document on disk.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so a crash mid-write leaves either the old or the new document,
//! never a truncated one.

use super::StorageBackend;
use crate::formats::{students_from_json, students_to_json};
use crate::{RosterError, Student};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A backend that stores every record in one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Use the document at `path`. The file need not exist yet.
    ///
    /// Missing parent directories are created on the first save.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the JSON document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "students.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StorageBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<Student>, RosterError> {
        match fs::read(&self.path) {
            Ok(bytes) => students_from_json(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RosterError::Persistence(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&mut self, students: &[Student]) -> Result<(), RosterError> {
        let data = students_to_json(students)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RosterError::Persistence(e.to_string()))?;
        }

        let temp = self.temp_path();
        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(&data)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(RosterError::Persistence(format!(
                "Failed to write {}: {}",
                temp.display(),
                e
            )));
        }

        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            RosterError::Persistence(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

// =============================================================================
// TESTS
// =============================================================================
