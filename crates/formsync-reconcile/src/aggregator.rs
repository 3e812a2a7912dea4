//! Pure answer aggregation
//!
//! A stateless last-wins merge of snapshot answer maps, used directly when
//! conflict auditing is unnecessary and as the seed for the resolution
//! engine's aggregated output.

use std::collections::BTreeMap;

use formsync_core::domain::{AnswerValue, FormState};

/// Merges snapshot answer maps in caller-supplied order, last wins
///
/// A later snapshot's value for a key overwrites an earlier one, including
/// an explicit `Null`; only the absence of a key is skipped. Keys present in
/// a single snapshot are preserved, so the result's key set is the union of
/// all inputs' key sets.
///
/// Deterministic for a fixed input order, no conflict detection, no side
/// effects.
pub fn aggregate_answers<'a, I>(snapshots: I) -> BTreeMap<String, AnswerValue>
where
    I: IntoIterator<Item = &'a FormState>,
{
    let mut aggregated = BTreeMap::new();
    for snapshot in snapshots {
        for (field, value) in snapshot.answers() {
            aggregated.insert(field.clone(), value.clone());
        }
    }
    aggregated
}
