//! # roster-core
//!
//! The student record engine for Roster - THE LOGIC.
//!
//! This crate owns the live student set and everything computed from it:
//! validation, id allocation, atomic persistence, queries, statistics and
//! CSV transfer.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where records live (stateful)
//! - Is closed: records change only through validated, named-field operations
//! - Never leaves memory and the persisted backing out of step
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod formats;
pub mod manager;
pub mod mutation;
pub mod primitives;
pub mod query;
pub mod statistics;
pub mod storage;
pub mod store;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Activity, AttendanceBucket, Field, Grade, PerformanceBucket, RosterError, Student, Violation,
};

// =============================================================================
// RE-EXPORTS: Registry Engine
// =============================================================================

pub use export::{EXPORT_COLUMNS, ImportPlan, ImportReport, RowError, export_csv, plan_import};
pub use manager::Manager;
pub use mutation::StudentUpdate;
pub use query::{Filter, Sort, SortKey, StudentQuery};
pub use statistics::{PerformanceAnalysis, Standout, Statistics, StatisticsEngine, Trend};
pub use storage::{JsonFileBackend, MemoryBackend, RedbBackend, StorageBackend};
pub use store::RecordStore;
pub use validator::{StudentInput, Validator};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{students_from_json, students_to_json};
