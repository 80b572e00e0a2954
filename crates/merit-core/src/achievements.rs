//! Achievement rules and idempotent evaluation.
//!
//! Rules are pure predicates over the ledger history and the current
//! snapshot. Once a name is unlocked for an identity it is permanent:
//! already-unlocked names are skipped, never re-evaluated, so a predicate
//! that later turns false (e.g. "ever earned N") cannot revoke the unlock.

use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::types::{ReputationSnapshot, ScoreEntry};

/// Earned total at which [`CenturyClub`] unlocks.
pub const CENTURY_CLUB_EARNED: u64 = 100;

/// Spent total at which [`BigSpender`] unlocks.
pub const BIG_SPENDER_SPENT: u64 = 100;

/// Level at which [`HighFive`] unlocks.
pub const HIGH_FIVE_LEVEL: u64 = 5;

/// A named, permanently-unlockable condition.
///
/// Predicates must be pure: no side effects, deterministic for identical
/// inputs. Evaluation order across rules is registration order.
pub trait AchievementRule: Send + Sync {
    /// Unique display name, as surfaced in snapshots.
    fn name(&self) -> &str;

    /// Whether the condition holds for the given history and snapshot.
    fn unlocked(&self, entries: &[ScoreEntry], snapshot: &ReputationSnapshot) -> bool;
}

/// Unlocks on the first entry ever recorded.
pub struct FirstSteps;

impl AchievementRule for FirstSteps {
    fn name(&self) -> &str {
        "First Steps"
    }

    fn unlocked(&self, entries: &[ScoreEntry], _snapshot: &ReputationSnapshot) -> bool {
        !entries.is_empty()
    }
}

/// Unlocks once lifetime earnings reach [`CENTURY_CLUB_EARNED`].
pub struct CenturyClub;

impl AchievementRule for CenturyClub {
    fn name(&self) -> &str {
        "Century Club"
    }

    fn unlocked(&self, _entries: &[ScoreEntry], snapshot: &ReputationSnapshot) -> bool {
        snapshot.total_earned >= CENTURY_CLUB_EARNED
    }
}

/// Unlocks on reaching level [`HIGH_FIVE_LEVEL`].
pub struct HighFive;

impl AchievementRule for HighFive {
    fn name(&self) -> &str {
        "High Five"
    }

    fn unlocked(&self, _entries: &[ScoreEntry], snapshot: &ReputationSnapshot) -> bool {
        snapshot.level >= HIGH_FIVE_LEVEL
    }
}

/// Unlocks once lifetime spending reaches [`BIG_SPENDER_SPENT`].
pub struct BigSpender;

impl AchievementRule for BigSpender {
    fn name(&self) -> &str {
        "Big Spender"
    }

    fn unlocked(&self, _entries: &[ScoreEntry], snapshot: &ReputationSnapshot) -> bool {
        snapshot.total_spent >= BIG_SPENDER_SPENT
    }
}

/// Ordered set of registered achievement rules.
///
/// Loaded once at startup and immutable for the process lifetime.
pub struct AchievementRegistry {
    rules: Vec<Box<dyn AchievementRule>>,
}

impl AchievementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The default rule set shipped with the engine.
    pub fn baseline() -> Self {
        let mut registry = Self::new();
        for rule in [
            Box::new(FirstSteps) as Box<dyn AchievementRule>,
            Box::new(CenturyClub),
            Box::new(HighFive),
            Box::new(BigSpender),
        ] {
            registry
                .register(rule)
                .expect("baseline rule names are unique");
        }
        registry
    }

    /// Register a rule.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateRule`] if a rule with the same name exists.
    pub fn register(&mut self, rule: Box<dyn AchievementRule>) -> Result<(), ConfigError> {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(ConfigError::DuplicateRule(rule.name().to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names newly unlocked by the current ledger state.
    ///
    /// Rules whose names appear in `already_unlocked` are skipped, never
    /// re-evaluated. Safe to call redundantly.
    pub fn evaluate(
        &self,
        entries: &[ScoreEntry],
        already_unlocked: &BTreeSet<String>,
        snapshot: &ReputationSnapshot,
    ) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| !already_unlocked.contains(rule.name()))
            .filter(|rule| rule.unlocked(entries, snapshot))
            .map(|rule| rule.name().to_string())
            .collect()
    }
}

impl Default for AchievementRegistry {
    /// The baseline rule set.
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentityId;
    use chrono::Utc;

    fn entry(delta: i64) -> ScoreEntry {
        ScoreEntry {
            identity: IdentityId::from("alice"),
            delta,
            reason: "test".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn snapshot(score: u64, level: u64, earned: u64, spent: u64) -> ReputationSnapshot {
        ReputationSnapshot {
            identity: IdentityId::from("alice"),
            score,
            level,
            total_earned: earned,
            total_spent: spent,
            achievements: BTreeSet::new(),
            last_updated: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn first_steps_unlocks_on_first_entry() {
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(10)];
        let snap = snapshot(10, 1, 10, 0);
        let unlocked = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert_eq!(unlocked, vec!["First Steps"]);
    }

    #[test]
    fn nothing_unlocks_on_empty_ledger() {
        let registry = AchievementRegistry::baseline();
        let snap = snapshot(0, 1, 0, 0);
        assert!(registry.evaluate(&[], &BTreeSet::new(), &snap).is_empty());
    }

    #[test]
    fn century_club_requires_earned_total() {
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(99)];
        let snap = snapshot(99, 1, 99, 0);
        let unlocked = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert!(!unlocked.contains(&"Century Club".to_string()));

        let entries = vec![entry(100)];
        let snap = snapshot(100, 2, 100, 0);
        let unlocked = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert!(unlocked.contains(&"Century Club".to_string()));
    }

    #[test]
    fn century_club_counts_earnings_not_balance() {
        // Earned 100 then spent 60: balance 40, but lifetime earnings qualify.
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(100), entry(-60)];
        let snap = snapshot(40, 1, 100, 60);
        let unlocked = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert!(unlocked.contains(&"Century Club".to_string()));
    }

    #[test]
    fn already_unlocked_names_are_skipped() {
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(100)];
        let snap = snapshot(100, 2, 100, 0);
        let already: BTreeSet<String> =
            ["First Steps".to_string(), "Century Club".to_string()].into();
        assert!(registry.evaluate(&entries, &already, &snap).is_empty());
    }

    #[test]
    fn permanence_survives_predicate_turning_false() {
        // "High Five" was unlocked at level 5; the identity has since spent
        // down to level 1. The unlocked name must be skipped, not revoked.
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(2_500), entry(-2_450)];
        let snap = snapshot(50, 1, 2_500, 2_450);
        let already: BTreeSet<String> = [
            "First Steps".to_string(),
            "Century Club".to_string(),
            "High Five".to_string(),
            "Big Spender".to_string(),
        ]
        .into();
        assert!(registry.evaluate(&entries, &already, &snap).is_empty());
    }

    #[test]
    fn high_five_and_big_spender_thresholds() {
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(2_500)];
        let snap = snapshot(2_500, 5, 2_500, 0);
        let unlocked = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert!(unlocked.contains(&"High Five".to_string()));
        assert!(!unlocked.contains(&"Big Spender".to_string()));

        let snap = snapshot(2_400, 4, 2_500, 100);
        let unlocked = registry.evaluate(&[entry(2_500), entry(-100)], &BTreeSet::new(), &snap);
        assert!(unlocked.contains(&"Big Spender".to_string()));
    }

    #[test]
    fn duplicate_rule_rejected() {
        let mut registry = AchievementRegistry::baseline();
        let err = registry.register(Box::new(FirstSteps)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRule("First Steps".to_string()));
    }

    #[test]
    fn evaluation_is_idempotent_for_identical_inputs() {
        let registry = AchievementRegistry::baseline();
        let entries = vec![entry(100)];
        let snap = snapshot(100, 2, 100, 0);
        let first = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        let second = registry.evaluate(&entries, &BTreeSet::new(), &snap);
        assert_eq!(first, second);
    }
}
