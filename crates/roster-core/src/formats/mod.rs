//! # Formats
//!
//! Pure byte-level encodings of the record set.

pub mod persistence;

pub use persistence::{students_from_json, students_to_json};
