//! FormSync Reconcile - Answer reconciliation engine
//!
//! Takes N independent snapshots of a form's answers and produces one
//! aggregated answer set plus a structured, auditable record of every
//! disagreement and how it was resolved.
//!
//! Provides:
//! - Pure last-wins aggregation (`aggregate_answers`)
//! - Field-by-field conflict detection and classification (`ConflictDetector`)
//! - Configurable resolution strategies with per-field overrides
//! - Bounded-by-the-host history of all conflicts and resolutions

pub mod aggregator;
pub mod detector;
pub mod engine;
pub mod error;
pub mod history;
pub mod options;
pub mod policy;
pub mod resolver;

pub use aggregator::aggregate_answers;
pub use detector::{ConflictDetector, ValidSnapshot};
pub use engine::{AggregationResult, ReconcileEngine, ResolutionSummary};
pub use error::ReconcileError;
pub use history::HistoryLedger;
pub use options::{
    ReconcileConfig, ResolutionOptions, ResolutionOptionsPatch, SnapshotRef,
    DEFAULT_CONFLICT_WINDOW_SECS,
};
pub use policy::{FieldRule, StrategyPolicy};
