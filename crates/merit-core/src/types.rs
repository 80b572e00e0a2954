//! Core reputation types: identities, ledger entries, snapshots.
//!
//! Scores are unsigned (`u64`) because the ledger never lets the running
//! sum go negative; individual deltas are signed (`i64`).

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque key identifying a reputation subject (wallet address or user id).
///
/// Identities are created lazily on first award and never deleted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Create an identity key from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying string key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw bytes of the key, for storage layouts.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One immutable ledger record of a reputation delta.
///
/// Entries for an identity, in insertion order, sum to that identity's
/// current score. Entries are never mutated or deleted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    /// Subject the delta applies to.
    pub identity: IdentityId,
    /// Signed delta: positive = earned, negative = spent. Never zero.
    pub delta: i64,
    /// Human-readable justification for the delta. Never empty.
    pub reason: String,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

/// Derived, point-in-time view of an identity's reputation.
///
/// Always recomputed from the ledger plus the level table plus the
/// unlocked-achievement set; never stored as authoritative state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReputationSnapshot {
    /// Subject of the snapshot.
    pub identity: IdentityId,
    /// Current score: sum of all deltas. Never negative.
    pub score: u64,
    /// Current level, 1-based, derived from the threshold table.
    pub level: u64,
    /// Sum of all positive deltas over the ledger's lifetime.
    pub total_earned: u64,
    /// Sum of the absolute values of all negative deltas.
    pub total_spent: u64,
    /// Permanently unlocked achievement names, in lexicographic order.
    pub achievements: BTreeSet<String>,
    /// Timestamp of the most recent entry. `None` until the first entry.
    pub last_updated: Option<DateTime<Utc>>,
    /// Raw deltas in insertion order. Display-only; the ledger is
    /// authoritative.
    pub history: Vec<i64>,
}
