//! # merit-engine — Service composition and persistent storage.
//!
//! Composes the Merit subsystems into a running reputation engine:
//! - [`storage::RocksLedger`] — persistent score ledger backed by RocksDB
//! - [`service::ReputationService`] — the single mutation entry point
//! - [`config::EngineConfig`] — engine configuration and backend selection

pub mod config;
pub mod service;
pub mod storage;

pub use config::{EngineConfig, ScoringBackend};
pub use service::ReputationService;
pub use storage::RocksLedger;
