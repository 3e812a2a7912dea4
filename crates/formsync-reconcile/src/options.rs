//! Engine configuration
//!
//! Provides typed options for the reconciliation engine, a partial-update
//! patch for live reconfiguration, and a serde-loadable configuration
//! section with fail-fast validation: an unknown strategy name or a bad
//! field rule is rejected here, never deep inside `aggregate()`.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use formsync_core::domain::{FormId, Strategy};

use crate::error::ReconcileError;
use crate::policy::FieldRule;

/// Default conflict window, in seconds
///
/// Two disagreeing edits whose save instants fall within this window are
/// treated as concurrent ("edited at the same time") rather than as one
/// stale write overwriting another. Five minutes models near-simultaneous
/// editing across tabs and auto-save ticks; hosts with tighter or looser
/// sessions should override it explicitly.
pub const DEFAULT_CONFLICT_WINDOW_SECS: i64 = 300;

/// Designation of the authoritative ("local") snapshot for the
/// `Local`/`Remote` strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotRef {
    /// By ordinal position in the caller-supplied snapshot order
    Ordinal(usize),
    /// By the snapshot's form id
    Id(FormId),
}

/// Live configuration of a reconciliation engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOptions {
    strategy: Strategy,
    auto_resolve: bool,
    conflict_window: Duration,
    authority: Option<SnapshotRef>,
    critical_fields: BTreeSet<String>,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Timestamp,
            auto_resolve: true,
            conflict_window: Duration::seconds(DEFAULT_CONFLICT_WINDOW_SECS),
            authority: None,
            critical_fields: BTreeSet::new(),
        }
    }
}

impl ResolutionOptions {
    /// Creates options with the given default strategy and defaults for
    /// everything else
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Returns the default resolution strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns whether conflicts are resolved automatically
    pub fn auto_resolve(&self) -> bool {
        self.auto_resolve
    }

    /// Returns the concurrent-edit window
    pub fn conflict_window(&self) -> Duration {
        self.conflict_window
    }

    /// Returns the designated authoritative snapshot, if any
    pub fn authority(&self) -> Option<&SnapshotRef> {
        self.authority.as_ref()
    }

    /// Returns the caller-flagged critical field ids
    ///
    /// A `Low` conflict on a critical field is reported as `Medium`; this is
    /// the only rule that produces `Medium` severity.
    pub fn critical_fields(&self) -> &BTreeSet<String> {
        &self.critical_fields
    }

    /// Sets whether conflicts are resolved automatically
    pub fn with_auto_resolve(mut self, auto_resolve: bool) -> Self {
        self.auto_resolve = auto_resolve;
        self
    }

    /// Sets the concurrent-edit window
    pub fn with_conflict_window(mut self, window: Duration) -> Self {
        self.conflict_window = window;
        self
    }

    /// Designates the authoritative snapshot for `Local`/`Remote`
    pub fn with_authority(mut self, authority: SnapshotRef) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Replaces the critical field set
    pub fn with_critical_fields(mut self, fields: BTreeSet<String>) -> Self {
        self.critical_fields = fields;
        self
    }

    /// Checks internal consistency
    ///
    /// `Local` and `Remote` need a designated snapshot to be meaningful;
    /// rejecting the omission here keeps it a configuration error rather
    /// than a silent fallback during aggregation.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if matches!(self.strategy, Strategy::Local | Strategy::Remote) && self.authority.is_none()
        {
            return Err(ReconcileError::MissingAuthority(self.strategy));
        }
        Ok(())
    }
}

/// Partial update to [`ResolutionOptions`]
///
/// Unset fields leave the live configuration untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionOptionsPatch {
    /// New default strategy
    pub strategy: Option<Strategy>,
    /// New auto-resolve flag
    pub auto_resolve: Option<bool>,
    /// New concurrent-edit window
    pub conflict_window: Option<Duration>,
    /// New authoritative snapshot designation
    pub authority: Option<SnapshotRef>,
    /// New critical field set
    pub critical_fields: Option<BTreeSet<String>>,
}

impl ResolutionOptionsPatch {
    /// Merges the set fields into `options`
    pub fn apply(self, options: &mut ResolutionOptions) {
        if let Some(strategy) = self.strategy {
            options.strategy = strategy;
        }
        if let Some(auto_resolve) = self.auto_resolve {
            options.auto_resolve = auto_resolve;
        }
        if let Some(window) = self.conflict_window {
            options.conflict_window = window;
        }
        if let Some(authority) = self.authority {
            options.authority = Some(authority);
        }
        if let Some(fields) = self.critical_fields {
            options.critical_fields = fields;
        }
    }
}

/// Reconciliation section of a host configuration file
///
/// Maps one-to-one onto the YAML the host ships; promoted to validated
/// [`ResolutionOptions`] + rules by [`ReconcileConfig::into_parts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Default strategy: `local`, `remote`, `timestamp`, `merge`, or `manual`
    pub default_strategy: String,
    /// Whether conflicts are resolved automatically
    pub auto_resolve: bool,
    /// Concurrent-edit window in seconds
    pub conflict_window_secs: i64,
    /// Authoritative snapshot for `local`/`remote` (form id or ordinal)
    #[serde(default)]
    pub authority: Option<SnapshotRef>,
    /// Field ids whose conflicts are reported at `Medium` severity
    #[serde(default)]
    pub critical_fields: Vec<String>,
    /// Per-field strategy override rules, first-match-wins
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::Timestamp.to_string(),
            auto_resolve: true,
            conflict_window_secs: DEFAULT_CONFLICT_WINDOW_SECS,
            authority: None,
            critical_fields: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl ReconcileConfig {
    /// Load configuration from a YAML file at `path`
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReconcileConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Promotes the raw configuration to validated options and rules
    ///
    /// Fails fast on an unknown strategy name, a missing authority for
    /// `local`/`remote`, or an invalid field rule.
    pub fn into_parts(self) -> Result<(ResolutionOptions, Vec<FieldRule>), ReconcileError> {
        let strategy: Strategy = self.default_strategy.parse()?;

        for rule in &self.rules {
            rule.validate()?;
        }

        let mut options = ResolutionOptions::new(strategy)
            .with_auto_resolve(self.auto_resolve)
            .with_conflict_window(Duration::seconds(self.conflict_window_secs))
            .with_critical_fields(self.critical_fields.into_iter().collect());
        if let Some(authority) = self.authority {
            options = options.with_authority(authority);
        }
        options.validate()?;

        Ok((options, self.rules))
    }
}
