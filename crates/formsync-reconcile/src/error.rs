//! Error types for the reconciliation engine

use formsync_core::domain::{DomainError, Strategy};
use thiserror::Error;

/// Errors that can occur while configuring or running the engine
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// `Local`/`Remote` strategy configured without a designated snapshot
    #[error("strategy '{0}' requires a designated authoritative snapshot")]
    MissingAuthority(Strategy),

    /// Invalid glob pattern or strategy in a field rule
    #[error("invalid field rule '{pattern}': {reason}")]
    InvalidRule { pattern: String, reason: String },

    /// Domain-level validation failure (bad strategy name, bad identifier)
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(#[from] anyhow::Error),
}
