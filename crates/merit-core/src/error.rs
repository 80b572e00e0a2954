//! Error types for the Merit reputation engine.
use thiserror::Error;

/// Business-rule failures raised by ledger mutations.
///
/// These are synchronous, typed rejections returned to the immediate
/// caller. None of them is retriable: they signal invalid input or a
/// legitimate business-rule violation, not a transient fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid delta: must be a non-zero integer")] InvalidDelta,
    #[error("empty reason")] EmptyReason,
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("value overflow")] ValueOverflow,
}

/// Startup-time configuration validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("empty threshold table")] EmptyThresholds,
    #[error("decreasing threshold at index {index}")] DecreasingThresholds { index: usize },
    #[error("duplicate achievement rule: {0}")] DuplicateRule(String),
}

/// Umbrella error for the Merit engine.
///
/// Business errors ([`LedgerError`]) and infrastructure faults
/// (`Storage`) stay distinct so the HTTP layer can map them to 4xx and
/// 5xx respectively.
#[derive(Error, Debug)]
pub enum MeritError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error("storage: {0}")] Storage(String),
}

impl MeritError {
    /// Whether this error is a caller-side business rejection rather than
    /// an infrastructure fault.
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Ledger(_))
    }
}
