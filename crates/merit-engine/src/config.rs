//! Engine configuration and backend selection.
//!
//! The backend is explicit configuration, never inferred from the
//! environment inside business logic: [`ScoringBackend::InMemory`] for
//! tests and demo deployments, [`ScoringBackend::LedgerBacked`] for
//! durable ones. Configuration is loaded once at process start and
//! immutable for the process lifetime.

use std::path::PathBuf;

use merit_core::constants::DEFAULT_LEVEL_THRESHOLDS;

/// Which score ledger the service runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringBackend {
    /// Volatile in-memory ledger. State dies with the process.
    InMemory,
    /// RocksDB-backed ledger rooted at `data_dir`.
    LedgerBacked {
        /// Directory holding the ledger database.
        data_dir: PathBuf,
    },
}

/// Configuration for a reputation engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Score ledger backend.
    pub backend: ScoringBackend,
    /// Level thresholds, index position = level − 1.
    pub thresholds: Vec<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: ScoringBackend::InMemory,
            thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

impl EngineConfig {
    /// In-memory engine with the default threshold table.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Disk-backed engine rooted at `data_dir`, default thresholds.
    pub fn ledger_backed(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: ScoringBackend::LedgerBacked { data_dir: data_dir.into() },
            ..Self::default()
        }
    }

    /// Replace the threshold table.
    pub fn with_thresholds(mut self, thresholds: Vec<u64>) -> Self {
        self.thresholds = thresholds;
        self
    }
}
