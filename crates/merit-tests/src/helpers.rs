//! Shared test helpers for invariant and e2e tests.

use std::sync::Arc;

use merit_core::achievements::AchievementRegistry;
use merit_core::ledger::MemoryLedger;
use merit_core::level::LevelTable;
use merit_engine::{EngineConfig, ReputationService};

/// In-memory service with the default threshold table and baseline rules.
pub fn memory_service() -> ReputationService {
    ReputationService::open(EngineConfig::in_memory()).expect("in-memory engine always opens")
}

/// Service over an explicit memory ledger, for direct store inspection.
pub fn service_with_ledger(ledger: Arc<MemoryLedger>) -> ReputationService {
    ReputationService::with_store(
        ledger,
        LevelTable::default(),
        AchievementRegistry::baseline(),
    )
}
