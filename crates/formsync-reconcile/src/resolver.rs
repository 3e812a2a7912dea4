//! Strategy value selection
//!
//! Pure helpers that pick or construct the winning value for a conflict's
//! candidate list. The engine decides which helper to call per the
//! configured strategy; everything here is side-effect free.

use std::collections::BTreeMap;

use formsync_core::domain::{AnswerValue, CandidateValue, FormId};

/// Picks the candidate with the latest save instant
///
/// Ties on the instant are broken deterministically: the candidate whose
/// `form_id` sorts lexicographically last wins.
pub fn pick_latest(candidates: &[CandidateValue]) -> Option<&CandidateValue> {
    candidates.iter().max_by(|a, b| {
        a.saved_at()
            .cmp(&b.saved_at())
            .then_with(|| a.source().cmp(b.source()))
    })
}

/// Picks the latest candidate not owned by the designated local snapshot
///
/// Returns `None` when every candidate is local-owned, in which case the
/// caller falls back to [`pick_latest`] over the full list.
pub fn pick_latest_excluding<'a>(
    candidates: &'a [CandidateValue],
    local: &FormId,
) -> Option<&'a CandidateValue> {
    let remote: Vec<&CandidateValue> = candidates
        .iter()
        .filter(|c| c.source() != local)
        .collect();
    remote.into_iter().max_by(|a, b| {
        a.saved_at()
            .cmp(&b.saved_at())
            .then_with(|| a.source().cmp(b.source()))
    })
}

/// Merges composite candidates into a single value
///
/// - All lists: union with duplicates removed, first-seen order preserved
///   across candidates in their given order. Idempotent: merging the result
///   with any input again yields the same list.
/// - All maps: shallow key-wise merge, a later candidate wins per key; when
///   both sides of a key hold maps they are merged one level deeper.
/// - Anything else (scalars, mixed shapes): `None` — there is nothing to
///   merge and the caller degrades to timestamp selection.
pub fn merge_candidates(candidates: &[CandidateValue]) -> Option<AnswerValue> {
    if candidates.is_empty() {
        return None;
    }

    if candidates.iter().all(|c| c.value().as_list().is_some()) {
        let mut merged: Vec<AnswerValue> = Vec::new();
        for candidate in candidates {
            if let Some(items) = candidate.value().as_list() {
                for item in items {
                    if !merged.contains(item) {
                        merged.push(item.clone());
                    }
                }
            }
        }
        return Some(AnswerValue::List(merged));
    }

    if candidates.iter().all(|c| c.value().as_map().is_some()) {
        let mut merged: BTreeMap<String, AnswerValue> = BTreeMap::new();
        for candidate in candidates {
            if let Some(entries) = candidate.value().as_map() {
                for (key, value) in entries {
                    match (merged.get_mut(key), value) {
                        (Some(AnswerValue::Map(existing)), AnswerValue::Map(incoming)) => {
                            for (inner_key, inner_value) in incoming {
                                existing.insert(inner_key.clone(), inner_value.clone());
                            }
                        }
                        _ => {
                            merged.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        return Some(AnswerValue::Map(merged));
    }

    None
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn candidate(source: &str, value: impl Into<AnswerValue>, rfc3339: &str) -> CandidateValue {
        CandidateValue::new(
            FormId::new(source).unwrap(),
            value.into(),
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    fn list(items: &[&str]) -> AnswerValue {
        AnswerValue::List(items.iter().map(|s| (*s).into()).collect())
    }

    #[test]
    fn test_pick_latest() {
        let candidates = vec![
            candidate("tab-1", "John", "2026-03-01T10:00:00Z"),
            candidate("tab-2", "Jane", "2026-03-01T10:05:00Z"),
        ];

        let winner = pick_latest(&candidates).unwrap();
        assert_eq!(winner.source().as_str(), "tab-2");
        assert_eq!(winner.value(), &"Jane".into());
    }

    #[test]
    fn test_pick_latest_tie_break_by_form_id() {
        let candidates = vec![
            candidate("tab-b", "B", "2026-03-01T10:00:00Z"),
            candidate("tab-a", "A", "2026-03-01T10:00:00Z"),
        ];

        // Equal instants: lexicographically last form id wins
        let winner = pick_latest(&candidates).unwrap();
        assert_eq!(winner.source().as_str(), "tab-b");
    }

    #[test]
    fn test_pick_latest_empty() {
        assert!(pick_latest(&[]).is_none());
    }

    #[test]
    fn test_pick_latest_excluding() {
        let candidates = vec![
            candidate("local", "mine", "2026-03-01T10:10:00Z"),
            candidate("remote-1", "theirs", "2026-03-01T10:00:00Z"),
        ];
        let local = FormId::new("local").unwrap();

        let winner = pick_latest_excluding(&candidates, &local).unwrap();
        assert_eq!(winner.source().as_str(), "remote-1");

        let only_local = vec![candidate("local", "mine", "2026-03-01T10:10:00Z")];
        assert!(pick_latest_excluding(&only_local, &local).is_none());
    }

    #[test]
    fn test_merge_list_union() {
        let candidates = vec![
            candidate("tab-1", list(&["sports", "music"]), "2026-03-01T10:00:00Z"),
            candidate("tab-2", list(&["art", "music"]), "2026-03-01T10:05:00Z"),
        ];

        let merged = merge_candidates(&candidates).unwrap();
        assert_eq!(merged, list(&["sports", "music", "art"]));
    }

    #[test]
    fn test_merge_list_union_idempotent() {
        let a = candidate("tab-1", list(&["sports", "music"]), "2026-03-01T10:00:00Z");
        let b = candidate(
            "tab-2",
            list(&["sports", "music", "art"]),
            "2026-03-01T10:05:00Z",
        );

        let merged = merge_candidates(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(merged, list(&["sports", "music", "art"]));

        // Merging the result with either input yields the same result
        let again = merge_candidates(&[
            candidate("tab-3", merged.clone(), "2026-03-01T10:10:00Z"),
            a,
        ])
        .unwrap();
        assert_eq!(again, merged);
    }

    #[test]
    fn test_merge_maps_later_wins_per_key() {
        let first: AnswerValue = serde_json::from_str(
            r#"{"street": "Old Rd", "city": "Lisbon", "geo": {"lat": 1.0}}"#,
        )
        .unwrap();
        let second: AnswerValue =
            serde_json::from_str(r#"{"street": "New Ave", "geo": {"lng": 2.0}}"#).unwrap();

        let candidates = vec![
            candidate("tab-1", first, "2026-03-01T10:00:00Z"),
            candidate("tab-2", second, "2026-03-01T10:05:00Z"),
        ];

        let merged = merge_candidates(&candidates).unwrap();
        let expected: AnswerValue = serde_json::from_str(
            r#"{"street": "New Ave", "city": "Lisbon", "geo": {"lat": 1.0, "lng": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_merge_scalars_degrades() {
        let candidates = vec![
            candidate("tab-1", "John", "2026-03-01T10:00:00Z"),
            candidate("tab-2", "Jane", "2026-03-01T10:05:00Z"),
        ];
        assert!(merge_candidates(&candidates).is_none());
    }

    #[test]
    fn test_merge_mixed_shapes_degrades() {
        let candidates = vec![
            candidate("tab-1", list(&["a"]), "2026-03-01T10:00:00Z"),
            candidate("tab-2", "a", "2026-03-01T10:05:00Z"),
        ];
        assert!(merge_candidates(&candidates).is_none());
    }
}
