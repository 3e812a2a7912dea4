//! Form snapshot entities
//!
//! A snapshot (`FormState`) is one source's complete view of a form's
//! answers at a point in time: one browser tab, one device, one auto-save
//! tick. Snapshots are immutable inputs to the reconciliation engine; the
//! engine never mutates them.
//!
//! Snapshots arrive from the session layer as loosely-validated JSON, so
//! `form_id` and `last_saved` are carried as plain strings and promoted to
//! typed values by [`FormState::validate`]. A snapshot that fails promotion
//! becomes a `DataCorruption` conflict downstream instead of an error.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::FormId;
use super::value::AnswerValue;

/// Completion progress reported by the source
///
/// Informational only: progress never participates in merge decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormProgress {
    /// Sections the source considers complete
    #[serde(default)]
    completed_sections: BTreeSet<String>,
    /// Overall completion percentage (0-100)
    #[serde(default)]
    overall_progress: u8,
}

impl FormProgress {
    /// Creates a progress record, clamping the percentage to 0-100
    pub fn new(completed_sections: BTreeSet<String>, overall_progress: u8) -> Self {
        Self {
            completed_sections,
            overall_progress: overall_progress.min(100),
        }
    }

    /// Returns the completed section identifiers
    pub fn completed_sections(&self) -> &BTreeSet<String> {
        &self.completed_sections
    }

    /// Returns the overall completion percentage
    pub fn overall_progress(&self) -> u8 {
        self.overall_progress
    }
}

/// Validated metadata extracted from a snapshot
///
/// Produced by [`FormState::validate`]; everything the detector needs to
/// order and attribute a snapshot's answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    /// The validated source identifier
    pub form_id: FormId,
    /// The parsed save instant
    pub saved_at: DateTime<Utc>,
}

/// One observation of a form's answers at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    /// Opaque identifier of the submitting session/source
    #[serde(default)]
    form_id: String,
    /// Section the source was on when it saved (informational only)
    #[serde(default)]
    current_section: String,
    /// Field id to answer value mapping
    #[serde(default)]
    answers: BTreeMap<String, AnswerValue>,
    /// Completion progress (informational only)
    #[serde(default)]
    progress: FormProgress,
    /// RFC 3339 save timestamp; primary ordering key for time-based resolution
    #[serde(default)]
    last_saved: String,
    /// Opaque version string; not required to be numeric or monotonic
    #[serde(default)]
    version: String,
}

impl FormState {
    /// Creates a snapshot with the required identity fields
    ///
    /// # Example
    ///
    /// ```
    /// use formsync_core::domain::snapshot::FormState;
    ///
    /// let snapshot = FormState::new("tab-1", "2026-03-01T10:15:00Z")
    ///     .with_answer("name", "John Doe")
    ///     .with_version("v3");
    ///
    /// assert!(snapshot.validate().is_ok());
    /// ```
    pub fn new(form_id: impl Into<String>, last_saved: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            last_saved: last_saved.into(),
            ..Self::default()
        }
    }

    /// Returns the raw source identifier
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Returns the section the source was on
    pub fn current_section(&self) -> &str {
        &self.current_section
    }

    /// Returns the answer map
    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    /// Returns the answer for a field, if the snapshot has an opinion on it
    pub fn answer(&self, field: &str) -> Option<&AnswerValue> {
        self.answers.get(field)
    }

    /// Returns the completion progress
    pub fn progress(&self) -> &FormProgress {
        &self.progress
    }

    /// Returns the raw save timestamp string
    pub fn last_saved(&self) -> &str {
        &self.last_saved
    }

    /// Returns the opaque version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the section the source was on
    pub fn with_current_section(mut self, section: impl Into<String>) -> Self {
        self.current_section = section.into();
        self
    }

    /// Adds a single answer
    pub fn with_answer(mut self, field: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.answers.insert(field.into(), value.into());
        self
    }

    /// Replaces the whole answer map
    pub fn with_answers(mut self, answers: BTreeMap<String, AnswerValue>) -> Self {
        self.answers = answers;
        self
    }

    /// Sets the completion progress
    pub fn with_progress(mut self, progress: FormProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the opaque version string
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Checks the shape invariants the engine relies on
    ///
    /// Returns the validated source id and parsed save instant, or the first
    /// violation found: an empty `form_id` or an unparsable `last_saved`.
    pub fn validate(&self) -> Result<SnapshotMeta, DomainError> {
        let form_id = FormId::new(self.form_id.clone())?;
        let saved_at = DateTime::parse_from_rfc3339(&self.last_saved)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| DomainError::InvalidTimestamp {
                value: self.last_saved.clone(),
                reason: e.to_string(),
            })?;

        Ok(SnapshotMeta { form_id, saved_at })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = FormState::new("tab-1", "2026-03-01T10:15:00Z")
            .with_current_section("personal")
            .with_answer("name", "John Doe")
            .with_answer("age", 34i64)
            .with_version("v7");

        assert_eq!(snapshot.form_id(), "tab-1");
        assert_eq!(snapshot.current_section(), "personal");
        assert_eq!(snapshot.answer("name"), Some(&"John Doe".into()));
        assert_eq!(snapshot.answer("missing"), None);
        assert_eq!(snapshot.version(), "v7");
    }

    #[test]
    fn test_validate_ok() {
        let snapshot = FormState::new("tab-1", "2026-03-01T10:15:00+01:00");
        let meta = snapshot.validate().unwrap();

        assert_eq!(meta.form_id.as_str(), "tab-1");
        assert_eq!(meta.saved_at.to_rfc3339(), "2026-03-01T09:15:00+00:00");
    }

    #[test]
    fn test_validate_empty_form_id() {
        let snapshot = FormState::new("", "2026-03-01T10:15:00Z");
        assert!(matches!(
            snapshot.validate(),
            Err(DomainError::InvalidFormId(_))
        ));
    }

    #[test]
    fn test_validate_bad_timestamp() {
        let snapshot = FormState::new("tab-1", "yesterday-ish");
        assert!(matches!(
            snapshot.validate(),
            Err(DomainError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_progress_clamped() {
        let progress = FormProgress::new(BTreeSet::new(), 250);
        assert_eq!(progress.overall_progress(), 100);
    }

    #[test]
    fn test_deserialize_partial_json() {
        // Missing fields deserialize to defaults and surface as validation
        // failures, not deserialization errors.
        let snapshot: FormState = serde_json::from_value(json!({
            "answers": {"name": "Jane"}
        }))
        .unwrap();

        assert_eq!(snapshot.answer("name"), Some(&"Jane".into()));
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let snapshot = FormState::new("device-2", "2026-03-01T10:20:00Z")
            .with_answer("interests", AnswerValue::List(vec!["art".into()]))
            .with_progress(FormProgress::new(
                ["personal".to_string()].into_iter().collect(),
                40,
            ));

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: FormState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
