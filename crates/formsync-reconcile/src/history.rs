//! Conflict and resolution history
//!
//! Append-only logs of every conflict detected and every resolution
//! produced by an engine instance, oldest first. The ledger itself never
//! evicts; a host embedding the engine in a long-lived process imposes its
//! own cap by reading and clearing.

use formsync_core::domain::{Conflict, Resolution};

/// Append-only conflict/resolution logs for one engine instance
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    conflicts: Vec<Conflict>,
    resolutions: Vec<Resolution>,
}

impl HistoryLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one aggregation call's conflicts and resolutions
    pub fn record(&mut self, conflicts: &[Conflict], resolutions: &[Resolution]) {
        self.conflicts.extend_from_slice(conflicts);
        self.resolutions.extend_from_slice(resolutions);
    }

    /// All conflicts ever detected, oldest first
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// All resolutions ever produced, oldest first
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Empties both logs
    pub fn clear(&mut self) {
        self.conflicts.clear();
        self.resolutions.clear();
    }

    /// Returns true when both logs are empty
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.resolutions.is_empty()
    }
}
