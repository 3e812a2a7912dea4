//! Resolution engine
//!
//! Orchestrates detection and resolution over a snapshot batch: runs the
//! conflict detector, seeds the aggregated answer set from the pure
//! last-wins merge, applies the configured strategy per conflict, and
//! appends everything to the instance's history ledger.
//!
//! An engine instance holds mutable state (configuration + history) and is
//! not safe for unsynchronized concurrent mutation; the host serializes
//! access or gives each aggregation session its own instance.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use formsync_core::domain::{
    AnswerValue, Conflict, FormId, FormState, Resolution, Strategy,
};

use crate::aggregator::aggregate_answers;
use crate::detector::{ConflictDetector, ValidSnapshot};
use crate::error::ReconcileError;
use crate::history::HistoryLedger;
use crate::options::{ReconcileConfig, ResolutionOptions, ResolutionOptionsPatch, SnapshotRef};
use crate::policy::{FieldRule, StrategyPolicy};
use crate::resolver::{merge_candidates, pick_latest, pick_latest_excluding};

/// Per-call resolution summary
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolutionSummary {
    /// The default strategy configured at call time
    strategy: Strategy,
    /// Conflicts settled in this call
    resolved_count: usize,
    /// Conflicts left for the caller (manual strategy, auto-resolve off,
    /// or corruption)
    pending_count: usize,
    /// One record per settled conflict
    resolutions: Vec<Resolution>,
}

impl ResolutionSummary {
    /// Returns the default strategy configured at call time
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the number of conflicts settled in this call
    pub fn resolved_count(&self) -> usize {
        self.resolved_count
    }

    /// Returns the number of conflicts left for the caller
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Returns the resolution records for this call
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }
}

/// The outcome of one `aggregate()` call
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AggregationResult {
    /// The merged answer set
    aggregated_data: BTreeMap<String, AnswerValue>,
    /// Every disagreement found, resolved or not
    conflicts: Vec<Conflict>,
    /// How the disagreements were handled
    resolution: ResolutionSummary,
}

impl AggregationResult {
    /// Returns the merged answer set
    pub fn aggregated_data(&self) -> &BTreeMap<String, AnswerValue> {
        &self.aggregated_data
    }

    /// Returns every conflict found in this call
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Returns the resolution summary
    pub fn resolution(&self) -> &ResolutionSummary {
        &self.resolution
    }

    /// Returns true when at least one conflict awaits the caller
    pub fn has_pending(&self) -> bool {
        self.resolution.pending_count > 0
    }
}

/// Configurable, stateful reconciliation engine
pub struct ReconcileEngine {
    options: ResolutionOptions,
    policy: StrategyPolicy,
    history: HistoryLedger,
}

impl ReconcileEngine {
    /// Creates an engine with the given options and no field rules
    pub fn new(options: ResolutionOptions) -> Result<Self, ReconcileError> {
        Self::with_rules(options, &[])
    }

    /// Creates an engine with options and per-field strategy rules
    ///
    /// Rules are validated eagerly: a bad pattern or strategy name is a
    /// configuration error, not something to discover during aggregation.
    pub fn with_rules(
        options: ResolutionOptions,
        rules: &[FieldRule],
    ) -> Result<Self, ReconcileError> {
        options.validate()?;
        for rule in rules {
            rule.validate()?;
        }
        Ok(Self {
            options,
            policy: StrategyPolicy::new(rules),
            history: HistoryLedger::new(),
        })
    }

    /// Creates an engine from a raw configuration section
    pub fn from_config(config: ReconcileConfig) -> Result<Self, ReconcileError> {
        let (options, rules) = config.into_parts()?;
        Self::with_rules(options, &rules)
    }

    /// Returns the live configuration
    pub fn options(&self) -> &ResolutionOptions {
        &self.options
    }

    /// Merges a partial update into the live configuration
    ///
    /// Subsequent `aggregate()` calls use the new configuration; history
    /// already recorded is untouched. The merged configuration is validated
    /// before being committed.
    pub fn update_options(&mut self, patch: ResolutionOptionsPatch) -> Result<(), ReconcileError> {
        let mut updated = self.options.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        self.options = updated;
        Ok(())
    }

    /// Replaces the per-field strategy rules
    pub fn update_rules(&mut self, rules: &[FieldRule]) -> Result<(), ReconcileError> {
        for rule in rules {
            rule.validate()?;
        }
        self.policy = StrategyPolicy::new(rules);
        Ok(())
    }

    /// Reconciles a snapshot batch into one aggregated answer set
    ///
    /// Detects conflicts, seeds every field from the last-wins merge of the
    /// valid snapshots, then overwrites conflicting fields per the
    /// configured strategy when auto-resolve is on. All conflicts are
    /// always reported, resolved or pending, and appended to the history
    /// ledger along with the resolutions.
    pub fn aggregate(&mut self, snapshots: &[FormState]) -> AggregationResult {
        let (valid, mut conflicts) = ConflictDetector::screen(snapshots);
        conflicts.extend(ConflictDetector::detect_fields(
            &valid,
            self.options.conflict_window(),
            self.options.critical_fields(),
        ));

        // Last-wins seed gives every field a safe default, conflicting or not
        let mut aggregated_data = aggregate_answers(valid.iter().map(|s| s.state));

        let local = self.resolve_authority(snapshots, &valid);

        let mut resolutions = Vec::new();
        let mut pending_count = 0;

        for conflict in &conflicts {
            if conflict.is_corruption() {
                pending_count += 1;
                continue;
            }

            let strategy = self
                .policy
                .evaluate(conflict.field_id().as_str())
                .unwrap_or_else(|| self.options.strategy());

            if strategy == Strategy::Manual || !self.options.auto_resolve() {
                debug!(
                    field = %conflict.field_id(),
                    strategy = %strategy,
                    "Conflict left pending"
                );
                pending_count += 1;
                continue;
            }

            match self.apply_strategy(strategy, conflict, &valid, local.as_ref()) {
                Some((value, applied)) => {
                    aggregated_data.insert(conflict.field_id().as_str().to_string(), value.clone());
                    resolutions.push(Resolution::new(
                        conflict.field_id().clone(),
                        applied,
                        value,
                        true,
                    ));
                }
                None => {
                    pending_count += 1;
                }
            }
        }

        info!(
            snapshots = snapshots.len(),
            conflicts = conflicts.len(),
            resolved = resolutions.len(),
            pending = pending_count,
            "Aggregation complete"
        );

        self.history.record(&conflicts, &resolutions);

        AggregationResult {
            aggregated_data,
            conflicts,
            resolution: ResolutionSummary {
                strategy: self.options.strategy(),
                resolved_count: resolutions.len(),
                pending_count,
                resolutions,
            },
        }
    }

    /// All conflicts this instance has ever detected, oldest first
    pub fn conflict_history(&self) -> &[Conflict] {
        self.history.conflicts()
    }

    /// All resolutions this instance has ever produced, oldest first
    pub fn resolution_history(&self) -> &[Resolution] {
        self.history.resolutions()
    }

    /// Empties both history logs; configuration is untouched
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Maps the configured authority designation onto this batch
    ///
    /// An ordinal indexes the caller-supplied snapshot order, including any
    /// malformed entries. A designation that points at a missing or
    /// malformed snapshot degrades to timestamp resolution with a warning.
    fn resolve_authority(
        &self,
        snapshots: &[FormState],
        valid: &[ValidSnapshot<'_>],
    ) -> Option<FormId> {
        match self.options.authority() {
            None => None,
            Some(SnapshotRef::Id(id)) => {
                if valid.iter().any(|s| &s.meta.form_id == id) {
                    Some(id.clone())
                } else {
                    warn!(
                        form_id = %id,
                        "Designated snapshot not in batch; falling back to timestamp"
                    );
                    None
                }
            }
            Some(SnapshotRef::Ordinal(index)) => {
                match snapshots.get(*index).map(FormState::validate) {
                    Some(Ok(meta)) => Some(meta.form_id),
                    _ => {
                        warn!(
                            index,
                            "Designated ordinal missing or malformed; falling back to timestamp"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Computes the winning value for one conflict
    ///
    /// Returns the value and the strategy that actually produced it:
    /// fallbacks record `Timestamp`, matching what happened rather than
    /// what was configured.
    fn apply_strategy(
        &self,
        strategy: Strategy,
        conflict: &Conflict,
        valid: &[ValidSnapshot<'_>],
        local: Option<&FormId>,
    ) -> Option<(AnswerValue, Strategy)> {
        let candidates = conflict.candidates();
        match strategy {
            Strategy::Manual => None,
            Strategy::Timestamp => {
                pick_latest(candidates).map(|c| (c.value().clone(), Strategy::Timestamp))
            }
            Strategy::Local => {
                let local_value = local.and_then(|id| {
                    valid
                        .iter()
                        .find(|s| &s.meta.form_id == id)
                        .and_then(|s| s.state.answer(conflict.field_id().as_str()))
                });
                match local_value {
                    Some(value) => Some((value.clone(), Strategy::Local)),
                    // Local snapshot has no opinion on this field
                    None => pick_latest(candidates).map(|c| (c.value().clone(), Strategy::Timestamp)),
                }
            }
            Strategy::Remote => match local {
                Some(id) => match pick_latest_excluding(candidates, id) {
                    Some(c) => Some((c.value().clone(), Strategy::Remote)),
                    None => {
                        pick_latest(candidates).map(|c| (c.value().clone(), Strategy::Timestamp))
                    }
                },
                None => pick_latest(candidates).map(|c| (c.value().clone(), Strategy::Timestamp)),
            },
            Strategy::Merge => match merge_candidates(candidates) {
                Some(value) => Some((value, Strategy::Merge)),
                // Scalars or mixed shapes: nothing to merge
                None => pick_latest(candidates).map(|c| (c.value().clone(), Strategy::Timestamp)),
            },
        }
    }
}
