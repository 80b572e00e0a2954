//! RocksDB-backed persistent score ledger.
//!
//! Implements [`LedgerStore`] using column families for entries, per-identity
//! running totals, and unlocked achievements. Each append is one atomic
//! [`WriteBatch`]; per-identity mutation locks serialize racing writers so the
//! never-negative invariant holds on disk exactly as it does in memory.
//!
//! Entry keys are `len(identity) ‖ identity ‖ seq` (big-endian), giving an
//! ordered per-identity scan with no ambiguity between identities that are
//! prefixes of one another.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};

use merit_core::error::MeritError;
use merit_core::ledger::{apply_delta, validate_append, LedgerStore};
use merit_core::types::{IdentityId, ScoreEntry};

// --- Column family names ---

const CF_ENTRIES: &str = "entries";
const CF_META: &str = "meta";
const CF_ACHIEVEMENTS: &str = "achievements";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_ENTRIES, CF_META, CF_ACHIEVEMENTS];

/// On-disk form of a ledger entry. The identity lives in the key.
#[derive(bincode::Encode, bincode::Decode)]
struct StoredEntry {
    delta: i64,
    reason: String,
    timestamp_micros: i64,
}

/// Per-identity running totals and the next entry sequence number.
#[derive(bincode::Encode, bincode::Decode, Default, Clone)]
struct IdentityMeta {
    score: u64,
    next_seq: u64,
}

/// Entry key: 4-byte BE identity length, identity bytes, 8-byte BE sequence.
fn entry_key(identity: &IdentityId, seq: u64) -> Vec<u8> {
    let id = identity.as_bytes();
    let mut key = Vec::with_capacity(4 + id.len() + 8);
    key.extend_from_slice(&(id.len() as u32).to_be_bytes());
    key.extend_from_slice(id);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Scan prefix covering every entry of one identity.
fn entry_prefix(identity: &IdentityId) -> Vec<u8> {
    let id = identity.as_bytes();
    let mut prefix = Vec::with_capacity(4 + id.len());
    prefix.extend_from_slice(&(id.len() as u32).to_be_bytes());
    prefix.extend_from_slice(id);
    prefix
}

fn storage_err(e: impl std::fmt::Display) -> MeritError {
    MeritError::Storage(e.to_string())
}

/// RocksDB-backed persistent score ledger.
///
/// Stores entries, per-identity totals, and unlocked achievements in
/// separate column families. All mutations are atomic via [`WriteBatch`].
pub struct RocksLedger {
    db: DB,
    /// Per-identity write serialization. Readers do not take these locks.
    write_locks: DashMap<IdentityId, Arc<Mutex<()>>>,
}

impl RocksLedger {
    /// Open or create a ledger database at the given path.
    ///
    /// Creates all column families if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MeritError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(storage_err)?;

        Ok(Self { db, write_locks: DashMap::new() })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, MeritError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| MeritError::Storage(format!("missing column family: {name}")))
    }

    fn read_meta(&self, identity: &IdentityId) -> Result<IdentityMeta, MeritError> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, identity.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let (meta, _) =
                    bincode::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(storage_err)?;
                Ok(meta)
            }
            None => Ok(IdentityMeta::default()),
        }
    }

    fn lock_for(&self, identity: &IdentityId) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl LedgerStore for RocksLedger {
    fn append(
        &self,
        identity: &IdentityId,
        delta: i64,
        reason: &str,
    ) -> Result<ScoreEntry, MeritError> {
        validate_append(delta, reason)?;

        let lock = self.lock_for(identity);
        let _guard = lock.lock();

        let mut meta = self.read_meta(identity)?;
        let new_score = apply_delta(meta.score, delta)?;

        let entry = ScoreEntry {
            identity: identity.clone(),
            delta,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        };
        let stored = StoredEntry {
            delta,
            reason: entry.reason.clone(),
            timestamp_micros: entry.timestamp.timestamp_micros(),
        };

        let seq = meta.next_seq;
        meta.score = new_score;
        meta.next_seq += 1;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_ENTRIES)?,
            entry_key(identity, seq),
            bincode::encode_to_vec(&stored, bincode::config::standard()).map_err(storage_err)?,
        );
        batch.put_cf(
            self.cf(CF_META)?,
            identity.as_bytes(),
            bincode::encode_to_vec(&meta, bincode::config::standard()).map_err(storage_err)?,
        );
        self.db.write(batch).map_err(storage_err)?;

        Ok(entry)
    }

    fn entries(&self, identity: &IdentityId) -> Result<Vec<ScoreEntry>, MeritError> {
        let cf = self.cf(CF_ENTRIES)?;
        let prefix = entry_prefix(identity);
        let mut out = Vec::new();

        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(storage_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            let (stored, _): (StoredEntry, _) =
                bincode::decode_from_slice(&value, bincode::config::standard())
                    .map_err(storage_err)?;
            let timestamp = DateTime::<Utc>::from_timestamp_micros(stored.timestamp_micros)
                .ok_or_else(|| MeritError::Storage("corrupt entry timestamp".to_string()))?;
            out.push(ScoreEntry {
                identity: identity.clone(),
                delta: stored.delta,
                reason: stored.reason,
                timestamp,
            });
        }
        Ok(out)
    }

    fn current_score(&self, identity: &IdentityId) -> Result<u64, MeritError> {
        Ok(self.read_meta(identity)?.score)
    }

    fn entry_count(&self, identity: &IdentityId) -> Result<usize, MeritError> {
        Ok(self.read_meta(identity)?.next_seq as usize)
    }

    fn unlocked(&self, identity: &IdentityId) -> Result<BTreeSet<String>, MeritError> {
        let cf = self.cf(CF_ACHIEVEMENTS)?;
        match self.db.get_cf(cf, identity.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let (names, _): (Vec<String>, _) =
                    bincode::decode_from_slice(&bytes, bincode::config::standard())
                        .map_err(storage_err)?;
                Ok(names.into_iter().collect())
            }
            None => Ok(BTreeSet::new()),
        }
    }

    fn record_unlocked(&self, identity: &IdentityId, names: &[String]) -> Result<(), MeritError> {
        if names.is_empty() {
            return Ok(());
        }

        let lock = self.lock_for(identity);
        let _guard = lock.lock();

        let mut merged = self.unlocked(identity)?;
        merged.extend(names.iter().cloned());
        let flat: Vec<String> = merged.into_iter().collect();

        self.db
            .put_cf(
                self.cf(CF_ACHIEVEMENTS)?,
                identity.as_bytes(),
                bincode::encode_to_vec(&flat, bincode::config::standard()).map_err(storage_err)?,
            )
            .map_err(storage_err)
    }

    fn identities(&self) -> Result<Vec<IdentityId>, MeritError> {
        let cf = self.cf(CF_META)?;
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(storage_err)?;
            let id = String::from_utf8(key.to_vec())
                .map_err(|_| MeritError::Storage("non-utf8 identity key".to_string()))?;
            out.push(IdentityId::from(id));
        }
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        match self.cf(CF_META) {
            Ok(cf) => self.db.iterator_cf(cf, IteratorMode::Start).next().is_none(),
            Err(_) => true,
        }
    }
}
