//! Score ledger storage interface and in-memory implementation.
//!
//! Provides the [`LedgerStore`] trait for append-only score entries,
//! running balances, and unlocked-achievement sets. The [`MemoryLedger`]
//! is suitable for tests and demo deployments; durable deployments use
//! RocksDB (merit-engine).
//!
//! Mutations for the same identity are serialized inside the store, so the
//! never-negative and sum-consistency invariants hold under concurrent
//! callers. Different identities do not contend.

use std::collections::BTreeSet;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{LedgerError, MeritError};
use crate::types::{IdentityId, ScoreEntry};

/// Reject deltas and reasons that must never reach the ledger.
///
/// # Errors
///
/// - [`LedgerError::InvalidDelta`] if `delta` is zero
/// - [`LedgerError::EmptyReason`] if `reason` is empty or whitespace-only
pub fn validate_append(delta: i64, reason: &str) -> Result<(), LedgerError> {
    if delta == 0 {
        return Err(LedgerError::InvalidDelta);
    }
    if reason.trim().is_empty() {
        return Err(LedgerError::EmptyReason);
    }
    Ok(())
}

/// Apply a signed delta to an unsigned running score.
///
/// # Errors
///
/// - [`LedgerError::InsufficientBalance`] if the result would go negative
/// - [`LedgerError::ValueOverflow`] if the result would exceed `u64::MAX`
pub fn apply_delta(score: u64, delta: i64) -> Result<u64, LedgerError> {
    if delta >= 0 {
        score
            .checked_add(delta as u64)
            .ok_or(LedgerError::ValueOverflow)
    } else {
        let need = delta.unsigned_abs();
        score
            .checked_sub(need)
            .ok_or(LedgerError::InsufficientBalance { have: score, need })
    }
}

/// Durable, ordered, append-only store of score entries per identity.
///
/// The balance check and the append happen inside one per-identity
/// critical section, so a failed mutation leaves the ledger unchanged and
/// two racing deductions can never over-spend. Unknown identities are
/// treated as fresh: empty entries, score 0, no achievements.
pub trait LedgerStore: Send + Sync {
    /// Append a delta for `identity`, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidDelta`] if `delta` is zero
    /// - [`LedgerError::EmptyReason`] if `reason` is blank
    /// - [`LedgerError::InsufficientBalance`] if the running sum would go negative
    /// - [`LedgerError::ValueOverflow`] on arithmetic overflow
    fn append(
        &self,
        identity: &IdentityId,
        delta: i64,
        reason: &str,
    ) -> Result<ScoreEntry, MeritError>;

    /// All entries for `identity` in insertion order. Empty for unknown
    /// identities (not an error).
    fn entries(&self, identity: &IdentityId) -> Result<Vec<ScoreEntry>, MeritError>;

    /// Sum of all deltas for `identity`. 0 for unknown identities.
    fn current_score(&self, identity: &IdentityId) -> Result<u64, MeritError>;

    /// Number of entries recorded for `identity`.
    fn entry_count(&self, identity: &IdentityId) -> Result<usize, MeritError>;

    /// Achievement names already unlocked for `identity`.
    fn unlocked(&self, identity: &IdentityId) -> Result<BTreeSet<String>, MeritError>;

    /// Merge newly unlocked achievement names. Idempotent (set union).
    fn record_unlocked(&self, identity: &IdentityId, names: &[String]) -> Result<(), MeritError>;

    /// All identities the ledger has seen, in unspecified order.
    fn identities(&self) -> Result<Vec<IdentityId>, MeritError>;

    /// Whether no identity has any recorded state.
    fn is_empty(&self) -> bool;
}

/// Per-identity state held by the in-memory ledger.
#[derive(Default)]
struct IdentityRecord {
    entries: Vec<ScoreEntry>,
    score: u64,
    unlocked: BTreeSet<String>,
}

/// In-memory score ledger for tests and demo deployments.
///
/// Backed by a `DashMap`, whose per-key entry guards serialize racing
/// mutations for the same identity while leaving other identities free to
/// proceed. No persistence.
#[derive(Default)]
pub struct MemoryLedger {
    records: DashMap<IdentityId, IdentityRecord>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedger {
    fn append(
        &self,
        identity: &IdentityId,
        delta: i64,
        reason: &str,
    ) -> Result<ScoreEntry, MeritError> {
        validate_append(delta, reason)?;

        let mut record = self.records.entry(identity.clone()).or_default();
        match apply_delta(record.score, delta) {
            Ok(new_score) => {
                let entry = ScoreEntry {
                    identity: identity.clone(),
                    delta,
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                };
                record.score = new_score;
                record.entries.push(entry.clone());
                debug!(%identity, delta, score = new_score, "ledger: entry appended");
                Ok(entry)
            }
            Err(err) => {
                // A rejected first mutation must not leave a phantom
                // identity behind (it would show up on the leaderboard).
                let vacuous = record.entries.is_empty() && record.unlocked.is_empty();
                drop(record);
                if vacuous {
                    self.records
                        .remove_if(identity, |_, r| r.entries.is_empty() && r.unlocked.is_empty());
                }
                Err(err.into())
            }
        }
    }

    fn entries(&self, identity: &IdentityId) -> Result<Vec<ScoreEntry>, MeritError> {
        Ok(self
            .records
            .get(identity)
            .map(|r| r.entries.clone())
            .unwrap_or_default())
    }

    fn current_score(&self, identity: &IdentityId) -> Result<u64, MeritError> {
        Ok(self.records.get(identity).map(|r| r.score).unwrap_or(0))
    }

    fn entry_count(&self, identity: &IdentityId) -> Result<usize, MeritError> {
        Ok(self
            .records
            .get(identity)
            .map(|r| r.entries.len())
            .unwrap_or(0))
    }

    fn unlocked(&self, identity: &IdentityId) -> Result<BTreeSet<String>, MeritError> {
        Ok(self
            .records
            .get(identity)
            .map(|r| r.unlocked.clone())
            .unwrap_or_default())
    }

    fn record_unlocked(&self, identity: &IdentityId, names: &[String]) -> Result<(), MeritError> {
        if names.is_empty() {
            return Ok(());
        }
        let mut record = self.records.entry(identity.clone()).or_default();
        record.unlocked.extend(names.iter().cloned());
        Ok(())
    }

    fn identities(&self) -> Result<Vec<IdentityId>, MeritError> {
        Ok(self.records.iter().map(|r| r.key().clone()).collect())
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> IdentityId {
        IdentityId::from("alice")
    }

    #[test]
    fn append_accumulates_score() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), 100, "signup bonus").unwrap();
        ledger.append(&alice(), 50, "referral").unwrap();
        assert_eq!(ledger.current_score(&alice()).unwrap(), 150);
        assert_eq!(ledger.entry_count(&alice()).unwrap(), 2);
    }

    #[test]
    fn entries_preserve_insertion_order() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), 100, "signup bonus").unwrap();
        ledger.append(&alice(), -30, "spend").unwrap();
        ledger.append(&alice(), 7, "daily").unwrap();
        let deltas: Vec<i64> = ledger
            .entries(&alice())
            .unwrap()
            .iter()
            .map(|e| e.delta)
            .collect();
        assert_eq!(deltas, vec![100, -30, 7]);
    }

    #[test]
    fn zero_delta_rejected() {
        let ledger = MemoryLedger::new();
        let err = ledger.append(&alice(), 0, "noop").unwrap_err();
        assert!(matches!(err, MeritError::Ledger(LedgerError::InvalidDelta)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn blank_reason_rejected() {
        let ledger = MemoryLedger::new();
        let err = ledger.append(&alice(), 10, "   ").unwrap_err();
        assert!(matches!(err, MeritError::Ledger(LedgerError::EmptyReason)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn overdraft_rejected_and_ledger_unchanged() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), 100, "signup bonus").unwrap();
        let err = ledger.append(&alice(), -150, "penalty").unwrap_err();
        assert!(matches!(
            err,
            MeritError::Ledger(LedgerError::InsufficientBalance { have: 100, need: 150 })
        ));
        assert_eq!(ledger.current_score(&alice()).unwrap(), 100);
        assert_eq!(ledger.entry_count(&alice()).unwrap(), 1);
    }

    #[test]
    fn rejected_first_mutation_leaves_no_phantom_identity() {
        let ledger = MemoryLedger::new();
        let carol = IdentityId::from("carol");
        assert!(ledger.append(&carol, -5, "penalty").is_err());
        assert!(ledger.is_empty());
        assert!(ledger.identities().unwrap().is_empty());
    }

    #[test]
    fn unknown_identity_reads_as_fresh() {
        let ledger = MemoryLedger::new();
        let ghost = IdentityId::from("ghost");
        assert_eq!(ledger.current_score(&ghost).unwrap(), 0);
        assert!(ledger.entries(&ghost).unwrap().is_empty());
        assert!(ledger.unlocked(&ghost).unwrap().is_empty());
    }

    #[test]
    fn score_overflow_rejected() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), i64::MAX, "grant").unwrap();
        ledger.append(&alice(), i64::MAX, "grant").unwrap();
        // Score is now 2 * (i64::MAX), within u64 but near the top.
        let err = ledger.append(&alice(), i64::MAX, "grant").unwrap_err();
        assert!(matches!(err, MeritError::Ledger(LedgerError::ValueOverflow)));
    }

    #[test]
    fn record_unlocked_is_idempotent() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), 10, "signup bonus").unwrap();
        ledger
            .record_unlocked(&alice(), &["First Steps".to_string()])
            .unwrap();
        ledger
            .record_unlocked(&alice(), &["First Steps".to_string()])
            .unwrap();
        assert_eq!(ledger.unlocked(&alice()).unwrap().len(), 1);
    }

    #[test]
    fn identities_lists_every_subject_once() {
        let ledger = MemoryLedger::new();
        ledger.append(&alice(), 10, "signup bonus").unwrap();
        ledger.append(&IdentityId::from("bob"), 20, "signup bonus").unwrap();
        ledger.append(&alice(), 5, "daily").unwrap();
        let mut ids = ledger.identities().unwrap();
        ids.sort();
        assert_eq!(ids, vec![alice(), IdentityId::from("bob")]);
    }

    #[test]
    fn sum_of_entries_equals_current_score() {
        let ledger = MemoryLedger::new();
        for (delta, reason) in [(100, "a"), (-40, "b"), (25, "c"), (-5, "d")] {
            ledger.append(&alice(), delta, reason).unwrap();
        }
        let sum: i64 = ledger.entries(&alice()).unwrap().iter().map(|e| e.delta).sum();
        assert_eq!(sum as u64, ledger.current_score(&alice()).unwrap());
    }
}
