//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation failures and snapshot shape violations.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid form (source session) identifier
    #[error("Invalid form id: {0}")]
    InvalidFormId(String),

    /// Invalid field identifier
    #[error("Invalid field id: {0}")]
    InvalidFieldId(String),

    /// Snapshot timestamp could not be parsed to an absolute instant
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw timestamp string
        value: String,
        /// Why parsing failed
        reason: String,
    },

    /// Unknown resolution strategy name
    #[error("Unknown strategy: {0} (valid: local, remote, timestamp, merge, manual)")]
    UnknownStrategy(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
