//! Reputation service orchestration.
//!
//! The only mutation entry point. Each award/deduct appends to the ledger,
//! recomputes the level, evaluates achievement unlocks, persists them, and
//! returns the refreshed snapshot, so every snapshot a caller sees is
//! consistent with the ledger it was derived from.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use merit_core::achievements::AchievementRegistry;
use merit_core::error::{LedgerError, MeritError};
use merit_core::ledger::{LedgerStore, MemoryLedger};
use merit_core::level::{LevelProgress, LevelTable};
use merit_core::types::{IdentityId, ReputationSnapshot, ScoreEntry};

use crate::config::{EngineConfig, ScoringBackend};
use crate::storage::RocksLedger;

/// Orchestrates the score ledger, level table, and achievement rules.
///
/// The store, table, and registry are injected at construction and
/// immutable for the service's lifetime. Cheap to share behind an `Arc`;
/// all methods take `&self`.
pub struct ReputationService {
    store: Arc<dyn LedgerStore>,
    levels: LevelTable,
    rules: AchievementRegistry,
}

impl ReputationService {
    /// Build a service from configuration, selecting the backend explicitly.
    ///
    /// # Errors
    ///
    /// - [`MeritError::Config`] if the threshold table is invalid
    /// - [`MeritError::Storage`] if the disk-backed ledger cannot open
    pub fn open(config: EngineConfig) -> Result<Self, MeritError> {
        let store: Arc<dyn LedgerStore> = match config.backend {
            ScoringBackend::InMemory => Arc::new(MemoryLedger::new()),
            ScoringBackend::LedgerBacked { ref data_dir } => {
                Arc::new(RocksLedger::open(data_dir)?)
            }
        };
        let levels = LevelTable::new(config.thresholds)?;
        Ok(Self { store, levels, rules: AchievementRegistry::baseline() })
    }

    /// Build a service from explicit parts. Used by tests and embedders
    /// that bring their own store or rule set.
    pub fn with_store(
        store: Arc<dyn LedgerStore>,
        levels: LevelTable,
        rules: AchievementRegistry,
    ) -> Self {
        Self { store, levels, rules }
    }

    /// Award `amount` points to `identity`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidDelta`] if `amount` is zero
    /// - [`LedgerError::EmptyReason`] if `reason` is blank
    /// - [`LedgerError::ValueOverflow`] if the score would overflow
    pub fn award(
        &self,
        identity: &IdentityId,
        amount: u64,
        reason: &str,
    ) -> Result<ReputationSnapshot, MeritError> {
        let delta = i64::try_from(amount).map_err(|_| LedgerError::ValueOverflow)?;
        self.mutate(identity, delta, reason)
    }

    /// Deduct `amount` points from `identity`.
    ///
    /// A deduction beyond the current balance is a hard rejection
    /// ([`LedgerError::InsufficientBalance`]), never a floor-clamp: the
    /// score must reflect a truthful ledger.
    pub fn deduct(
        &self,
        identity: &IdentityId,
        amount: u64,
        reason: &str,
    ) -> Result<ReputationSnapshot, MeritError> {
        let delta = i64::try_from(amount).map_err(|_| LedgerError::ValueOverflow)?;
        self.mutate(identity, -delta, reason)
    }

    /// Read-only snapshot recomputation. Side-effect free: repeated calls
    /// with no intervening mutation return identical results. Unknown
    /// identities read as fresh (score 0, level 1, no achievements).
    pub fn snapshot(&self, identity: &IdentityId) -> Result<ReputationSnapshot, MeritError> {
        let entries = self.store.entries(identity)?;
        let unlocked = self.store.unlocked(identity)?;
        Ok(self.build_snapshot(identity, &entries, unlocked))
    }

    /// Level progress for `identity`, derived from the current score.
    pub fn progress(&self, identity: &IdentityId) -> Result<LevelProgress, MeritError> {
        let score = self.store.current_score(identity)?;
        Ok(self.levels.progress_toward_next(score))
    }

    /// Snapshots of all known identities, ordered by score descending with
    /// ties broken by identity ascending, truncated to `limit`.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<ReputationSnapshot>, MeritError> {
        let mut board = Vec::new();
        for identity in self.store.identities()? {
            board.push(self.snapshot(&identity)?);
        }
        board.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        board.truncate(limit);
        Ok(board)
    }

    /// The level table this service runs on.
    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    fn mutate(
        &self,
        identity: &IdentityId,
        delta: i64,
        reason: &str,
    ) -> Result<ReputationSnapshot, MeritError> {
        self.store.append(identity, delta, reason)?;
        info!(%identity, delta, reason, "reputation: ledger updated");

        let entries = self.store.entries(identity)?;
        let unlocked = self.store.unlocked(identity)?;
        let mut snapshot = self.build_snapshot(identity, &entries, unlocked);

        let newly = self
            .rules
            .evaluate(&entries, &snapshot.achievements, &snapshot);
        if !newly.is_empty() {
            self.store.record_unlocked(identity, &newly)?;
            info!(%identity, unlocked = ?newly, "reputation: achievements unlocked");
            snapshot.achievements.extend(newly);
        }
        Ok(snapshot)
    }

    fn build_snapshot(
        &self,
        identity: &IdentityId,
        entries: &[ScoreEntry],
        achievements: BTreeSet<String>,
    ) -> ReputationSnapshot {
        let mut score: u64 = 0;
        let mut total_earned: u64 = 0;
        let mut total_spent: u64 = 0;
        let mut history = Vec::with_capacity(entries.len());

        // The ledger rejects overflow and overdraft on append, so these
        // sums cannot wrap for a ledger it produced.
        for entry in entries {
            history.push(entry.delta);
            if entry.delta >= 0 {
                let earned = entry.delta as u64;
                total_earned = total_earned.saturating_add(earned);
                score = score.saturating_add(earned);
            } else {
                let spent = entry.delta.unsigned_abs();
                total_spent = total_spent.saturating_add(spent);
                score = score.saturating_sub(spent);
            }
        }

        ReputationSnapshot {
            identity: identity.clone(),
            score,
            level: self.levels.level_for(score),
            total_earned,
            total_spent,
            achievements,
            last_updated: entries.last().map(|e| e.timestamp),
            history,
        }
    }
}
