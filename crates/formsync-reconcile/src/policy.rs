//! Per-field strategy overrides
//!
//! Evaluates field rules from configuration to pick the resolution strategy
//! for a given field id. Rules are matched using glob patterns in
//! first-match-wins order; fields with no matching rule use the engine's
//! default strategy.

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use formsync_core::domain::Strategy;

use crate::error::ReconcileError;

/// A single per-field strategy rule from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Glob pattern to match field ids (e.g., "contact.*", "interests")
    pub pattern: String,
    /// Strategy to apply when the pattern matches
    pub strategy: String,
}

impl FieldRule {
    /// Validates the rule's glob pattern and strategy name
    pub fn validate(&self) -> Result<(), ReconcileError> {
        Pattern::new(&self.pattern).map_err(|e| ReconcileError::InvalidRule {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })?;

        self.strategy
            .parse::<Strategy>()
            .map_err(|e| ReconcileError::InvalidRule {
                pattern: self.pattern.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

/// Compiled per-field strategy rules
pub struct StrategyPolicy {
    rules: Vec<(Pattern, Strategy)>,
}

impl StrategyPolicy {
    /// Compiles a rule list, skipping invalid entries with a warning
    pub fn new(rules: &[FieldRule]) -> Self {
        let compiled: Vec<(Pattern, Strategy)> = rules
            .iter()
            .filter_map(|rule| {
                let pattern = match Pattern::new(&rule.pattern) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(
                            pattern = %rule.pattern,
                            error = %e,
                            "Skipping invalid field rule pattern"
                        );
                        return None;
                    }
                };
                let strategy = match rule.strategy.parse::<Strategy>() {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(
                            strategy = %rule.strategy,
                            error = %e,
                            "Skipping invalid field rule strategy"
                        );
                        return None;
                    }
                };
                Some((pattern, strategy))
            })
            .collect();

        debug!(rules_count = compiled.len(), "StrategyPolicy compiled");

        Self { rules: compiled }
    }

    /// Evaluates the rules for a field id, first-match-wins
    ///
    /// Returns `None` when no rule matches, in which case the engine's
    /// default strategy applies.
    pub fn evaluate(&self, field_id: &str) -> Option<Strategy> {
        for (pattern, strategy) in &self.rules {
            if pattern.matches(field_id) {
                trace!(
                    field = %field_id,
                    pattern = %pattern,
                    strategy = %strategy,
                    "Field rule matched"
                );
                return Some(*strategy);
            }
        }
        None
    }

    /// Returns the number of compiled rules
    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rules() {
        let policy = StrategyPolicy::new(&[]);
        assert_eq!(policy.evaluate("any_field"), None);
        assert_eq!(policy.rules_count(), 0);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            FieldRule {
                pattern: "interests".to_string(),
                strategy: "merge".to_string(),
            },
            FieldRule {
                pattern: "*".to_string(),
                strategy: "timestamp".to_string(),
            },
        ];

        let policy = StrategyPolicy::new(&rules);

        assert_eq!(policy.evaluate("interests"), Some(Strategy::Merge));
        assert_eq!(policy.evaluate("name"), Some(Strategy::Timestamp));
    }

    #[test]
    fn test_glob_patterns() {
        let rules = vec![FieldRule {
            pattern: "contact.*".to_string(),
            strategy: "manual".to_string(),
        }];

        let policy = StrategyPolicy::new(&rules);

        assert_eq!(policy.evaluate("contact.email"), Some(Strategy::Manual));
        assert_eq!(policy.evaluate("contact.phone"), Some(Strategy::Manual));
        assert_eq!(policy.evaluate("name"), None);
    }

    #[test]
    fn test_invalid_rules_skipped() {
        let rules = vec![
            FieldRule {
                pattern: "[invalid".to_string(),
                strategy: "merge".to_string(),
            },
            FieldRule {
                pattern: "name".to_string(),
                strategy: "newest".to_string(),
            },
            FieldRule {
                pattern: "age".to_string(),
                strategy: "timestamp".to_string(),
            },
        ];

        let policy = StrategyPolicy::new(&rules);
        assert_eq!(policy.rules_count(), 1);
        assert_eq!(policy.evaluate("age"), Some(Strategy::Timestamp));
    }

    #[test]
    fn test_rule_validate() {
        let good = FieldRule {
            pattern: "contact.*".to_string(),
            strategy: "merge".to_string(),
        };
        assert!(good.validate().is_ok());

        let bad_pattern = FieldRule {
            pattern: "[invalid".to_string(),
            strategy: "merge".to_string(),
        };
        assert!(matches!(
            bad_pattern.validate(),
            Err(ReconcileError::InvalidRule { .. })
        ));

        let bad_strategy = FieldRule {
            pattern: "name".to_string(),
            strategy: "yolo".to_string(),
        };
        assert!(matches!(
            bad_strategy.validate(),
            Err(ReconcileError::InvalidRule { .. })
        ));
    }
}
