//! Conflict domain entities
//!
//! This module defines types for classifying, tracking, and resolving
//! disagreements between independently-edited snapshots of a form's answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{ConflictId, FieldId, FormId};
use super::value::AnswerValue;

/// Classification of how snapshots disagree on a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Same runtime shape, different content
    Value,
    /// Different runtime shapes (e.g. list vs. scalar vs. map)
    Structure,
    /// Whole-snapshot version mismatch; reserved for whole-record callers,
    /// never emitted by field-level detection
    Version,
    /// Disagreeing edits whose save instants fall within the conflict window
    ConcurrentEdit,
    /// A snapshot failed basic shape invariants (missing form id,
    /// unparsable timestamp)
    DataCorruption,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictKind::Value => "value",
            ConflictKind::Structure => "structure",
            ConflictKind::Version => "version",
            ConflictKind::ConcurrentEdit => "concurrent_edit",
            ConflictKind::DataCorruption => "data_corruption",
        };
        write!(f, "{}", s)
    }
}

/// How serious a conflict is for the reviewing user
///
/// `Medium` is only produced by the caller-supplied critical-fields rule;
/// detection itself assigns `Low` or `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine disagreement, safe to auto-resolve
    Low,
    /// Disagreement on a field the caller flagged as critical
    Medium,
    /// Shape mismatch or corrupted input; review recommended
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// The policy used to settle a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// The designated authoritative snapshot wins
    Local,
    /// The latest non-authoritative snapshot wins
    Remote,
    /// The snapshot with the latest save instant wins
    Timestamp,
    /// Union lists / key-wise merge maps; scalars fall back to `Timestamp`
    Merge,
    /// Never auto-resolve; the caller supplies the value out-of-band
    Manual,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Local => "local",
            Strategy::Remote => "remote",
            Strategy::Timestamp => "timestamp",
            Strategy::Merge => "merge",
            Strategy::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Strategy {
    type Err = DomainError;

    /// Parses a strategy name, failing fast on unknown input so that a bad
    /// configuration is rejected before any aggregation runs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Strategy::Local),
            "remote" => Ok(Strategy::Remote),
            "timestamp" => Ok(Strategy::Timestamp),
            "merge" => Ok(Strategy::Merge),
            "manual" => Ok(Strategy::Manual),
            other => Err(DomainError::UnknownStrategy(other.to_string())),
        }
    }
}

/// One snapshot's value for a disputed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateValue {
    /// Source snapshot that holds this value
    source: FormId,
    /// The value itself
    value: AnswerValue,
    /// When the source saved it
    saved_at: DateTime<Utc>,
}

impl CandidateValue {
    /// Creates a candidate entry
    pub fn new(source: FormId, value: AnswerValue, saved_at: DateTime<Utc>) -> Self {
        Self {
            source,
            value,
            saved_at,
        }
    }

    /// Returns the source snapshot id
    pub fn source(&self) -> &FormId {
        &self.source
    }

    /// Returns the candidate value
    pub fn value(&self) -> &AnswerValue {
        &self.value
    }

    /// Returns when the source saved this value
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }
}

/// A field on which two or more snapshots disagree
///
/// Candidates are listed in first-seen order over the snapshots in input
/// order, one entry per distinct value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique identifier for this conflict
    id: ConflictId,
    /// The disagreeing field (the `__snapshot__` sentinel for corruption)
    field_id: FieldId,
    /// Classification of the disagreement
    kind: ConflictKind,
    /// How serious the disagreement is
    severity: Severity,
    /// True when all disagreeing edits fall within the conflict window
    concurrent: bool,
    /// One entry per distinct value held for the field
    candidates: Vec<CandidateValue>,
    /// Human-readable context, set for corruption conflicts
    detail: Option<String>,
    /// When the detector ran
    detected_at: DateTime<Utc>,
}

impl Conflict {
    /// Creates a field-level conflict
    pub fn new(
        field_id: FieldId,
        kind: ConflictKind,
        severity: Severity,
        candidates: Vec<CandidateValue>,
    ) -> Self {
        Self {
            id: ConflictId::new(),
            field_id,
            kind,
            severity,
            concurrent: false,
            candidates,
            detail: None,
            detected_at: Utc::now(),
        }
    }

    /// Creates a whole-snapshot corruption conflict on the sentinel field
    pub fn corruption(reason: impl Into<String>) -> Self {
        Self {
            id: ConflictId::new(),
            field_id: FieldId::snapshot_sentinel(),
            kind: ConflictKind::DataCorruption,
            severity: Severity::High,
            concurrent: false,
            candidates: Vec::new(),
            detail: Some(reason.into()),
            detected_at: Utc::now(),
        }
    }

    /// Marks the disagreeing edits as concurrent
    pub fn with_concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Attaches human-readable context
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the conflict ID
    pub fn id(&self) -> &ConflictId {
        &self.id
    }

    /// Returns the disputed field id
    pub fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    /// Returns the conflict classification
    pub fn kind(&self) -> ConflictKind {
        self.kind
    }

    /// Returns the conflict severity
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns true when all disagreeing edits fall within the window
    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// Returns the candidate values, one per distinct value
    pub fn candidates(&self) -> &[CandidateValue] {
        &self.candidates
    }

    /// Returns the human-readable context if any
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns when the detector ran
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Returns true if this is a whole-snapshot corruption conflict
    pub fn is_corruption(&self) -> bool {
        matches!(self.kind, ConflictKind::DataCorruption)
    }
}

/// The record produced when a conflict is settled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The field that was settled
    field_id: FieldId,
    /// The strategy that produced the value
    strategy_applied: Strategy,
    /// The value written into the aggregated answer set
    resolved_value: AnswerValue,
    /// When the resolution was produced
    resolved_at: DateTime<Utc>,
    /// True when the engine resolved it without user intervention
    auto_resolved: bool,
}

impl Resolution {
    /// Creates a resolution record stamped with the current instant
    pub fn new(
        field_id: FieldId,
        strategy_applied: Strategy,
        resolved_value: AnswerValue,
        auto_resolved: bool,
    ) -> Self {
        Self {
            field_id,
            strategy_applied,
            resolved_value,
            resolved_at: Utc::now(),
            auto_resolved,
        }
    }

    /// Returns the settled field id
    pub fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    /// Returns the strategy that produced the value
    pub fn strategy_applied(&self) -> Strategy {
        self.strategy_applied
    }

    /// Returns the resolved value
    pub fn resolved_value(&self) -> &AnswerValue {
        &self.resolved_value
    }

    /// Returns when the resolution was produced
    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    /// Returns true when the engine resolved it automatically
    pub fn auto_resolved(&self) -> bool {
        self.auto_resolved
    }
}
