//! Domain entities for answer reconciliation
//!
//! This module contains the core domain types for FormSync:
//! - Newtypes for type-safe identifiers
//! - Answer value representation
//! - Snapshot (form state) types
//! - Conflict classification and resolution record types
//! - Domain-specific error types

pub mod conflict;
pub mod errors;
pub mod newtypes;
pub mod snapshot;
pub mod value;

// Re-export commonly used types
pub use conflict::{CandidateValue, Conflict, ConflictKind, Resolution, Severity, Strategy};
pub use errors::DomainError;
pub use newtypes::{ConflictId, FieldId, FormId, SNAPSHOT_SENTINEL_FIELD};
pub use snapshot::{FormProgress, FormState, SnapshotMeta};
pub use value::{AnswerValue, ValueShape};
