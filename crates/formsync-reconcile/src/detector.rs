//! Conflict detection logic
//!
//! Compares snapshots field-by-field over the union of their answer keys
//! and emits one classified conflict per field holding two or more distinct
//! values. Malformed snapshots are screened out into `DataCorruption`
//! conflicts instead of aborting detection.

use std::collections::BTreeSet;

use chrono::Duration;
use tracing::{debug, warn};

use formsync_core::domain::{
    CandidateValue, Conflict, ConflictKind, FieldId, FormState, Severity, SnapshotMeta,
};

/// A snapshot that passed shape screening, paired with its parsed metadata
#[derive(Debug, Clone)]
pub struct ValidSnapshot<'a> {
    /// The screened snapshot
    pub state: &'a FormState,
    /// Its validated source id and save instant
    pub meta: SnapshotMeta,
}

/// Detects and classifies disagreements between snapshots
///
/// Stateless: safe to call concurrently on disjoint inputs. For a fixed
/// snapshot set the classification and ordering of the returned list are
/// identical across calls (corruption conflicts first in input order, then
/// field conflicts in ascending field id order).
pub struct ConflictDetector;

impl ConflictDetector {
    /// Detects all conflicts in a snapshot batch
    ///
    /// `window` is the concurrent-edit window: when every pair of
    /// disagreeing edits on a field saved within `window` of each other,
    /// the conflict is tagged concurrent. `critical_fields` upgrades `Low`
    /// field conflicts to `Medium`.
    pub fn detect(
        snapshots: &[FormState],
        window: Duration,
        critical_fields: &BTreeSet<String>,
    ) -> Vec<Conflict> {
        let (valid, mut conflicts) = Self::screen(snapshots);
        conflicts.extend(Self::detect_fields(&valid, window, critical_fields));
        conflicts
    }

    /// Screens out snapshots that fail basic shape invariants
    ///
    /// Each malformed snapshot (empty `form_id`, unparsable `last_saved`)
    /// yields one `DataCorruption` conflict keyed on the sentinel field and
    /// is excluded from field comparison; its absence from the field union
    /// is not itself flagged again.
    pub fn screen(snapshots: &[FormState]) -> (Vec<ValidSnapshot<'_>>, Vec<Conflict>) {
        let mut valid = Vec::new();
        let mut corrupt = Vec::new();

        for (index, snapshot) in snapshots.iter().enumerate() {
            match snapshot.validate() {
                Ok(meta) => valid.push(ValidSnapshot {
                    state: snapshot,
                    meta,
                }),
                Err(e) => {
                    warn!(
                        index,
                        form_id = %snapshot.form_id(),
                        error = %e,
                        "Excluding malformed snapshot from comparison"
                    );
                    corrupt.push(Conflict::corruption(format!("snapshot {index}: {e}")));
                }
            }
        }

        (valid, corrupt)
    }

    /// Compares screened snapshots field-by-field
    ///
    /// For every field in the union of answer keys, distinct values are
    /// collected by deep equality in first-seen order over the snapshots in
    /// input order. Each candidate is attributed to the latest snapshot
    /// holding its value, so a value reaffirmed by a later save competes
    /// with that later instant. Fields where all defining snapshots agree
    /// are silent.
    pub fn detect_fields(
        valid: &[ValidSnapshot<'_>],
        window: Duration,
        critical_fields: &BTreeSet<String>,
    ) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let field_union: BTreeSet<&String> = valid
            .iter()
            .flat_map(|snapshot| snapshot.state.answers().keys())
            .collect();

        for field in field_union {
            let mut candidates: Vec<CandidateValue> = Vec::new();
            for snapshot in valid {
                if let Some(value) = snapshot.state.answer(field) {
                    match candidates.iter_mut().find(|c| c.value() == value) {
                        Some(existing) => {
                            // A reaffirming save owns the candidate: the
                            // latest holder's instant is what timestamp
                            // resolution and the window check compare.
                            if (snapshot.meta.saved_at, &snapshot.meta.form_id)
                                > (existing.saved_at(), existing.source())
                            {
                                *existing = CandidateValue::new(
                                    snapshot.meta.form_id.clone(),
                                    value.clone(),
                                    snapshot.meta.saved_at,
                                );
                            }
                        }
                        None => candidates.push(CandidateValue::new(
                            snapshot.meta.form_id.clone(),
                            value.clone(),
                            snapshot.meta.saved_at,
                        )),
                    }
                }
            }

            // 0 or 1 distinct value: the defining snapshots agree
            if candidates.len() < 2 {
                continue;
            }

            let field_id = match FieldId::new(field.clone()) {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "Skipping field with unusable id");
                    continue;
                }
            };

            let first_shape = candidates[0].value().shape();
            let structure_mismatch = candidates
                .iter()
                .any(|c| c.value().shape() != first_shape);
            let concurrent = within_window(&candidates, window);

            let kind = if structure_mismatch {
                ConflictKind::Structure
            } else if concurrent {
                ConflictKind::ConcurrentEdit
            } else {
                ConflictKind::Value
            };

            let severity = match kind {
                ConflictKind::Structure => Severity::High,
                _ if critical_fields.contains(field) => Severity::Medium,
                _ => Severity::Low,
            };

            debug!(
                field = %field_id,
                kind = %kind,
                severity = %severity,
                concurrent,
                candidates = candidates.len(),
                "Field conflict detected"
            );

            conflicts.push(
                Conflict::new(field_id, kind, severity, candidates).with_concurrent(concurrent),
            );
        }

        conflicts
    }
}

/// True when every pair of candidate save instants falls within `window`
fn within_window(candidates: &[CandidateValue], window: Duration) -> bool {
    let earliest = candidates.iter().map(CandidateValue::saved_at).min();
    let latest = candidates.iter().map(CandidateValue::saved_at).max();
    match (earliest, latest) {
        (Some(earliest), Some(latest)) => latest - earliest <= window,
        _ => false,
    }
}
