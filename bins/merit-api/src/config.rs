//! API configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use merit_core::constants::DEFAULT_API_PORT;
use merit_engine::{EngineConfig, ScoringBackend};

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Engine configuration (backend and level thresholds).
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("MERIT_BIND_ADDR")
            .unwrap_or_else(|_| format!("127.0.0.1:{DEFAULT_API_PORT}"));

        let backend = match std::env::var("MERIT_BACKEND").as_deref() {
            Ok("memory") => ScoringBackend::InMemory,
            Ok("ledger") | Err(_) => {
                let data_dir = std::env::var("MERIT_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| {
                        dirs::data_dir()
                            .unwrap_or_else(|| PathBuf::from("."))
                            .join("merit")
                    });
                ScoringBackend::LedgerBacked { data_dir: data_dir.join("ledgerdata") }
            }
            Ok(other) => bail!("MERIT_BACKEND must be 'ledger' or 'memory', got '{other}'"),
        };

        let mut engine = EngineConfig::default();
        engine.backend = backend;
        if let Ok(raw) = std::env::var("MERIT_LEVEL_THRESHOLDS") {
            engine.thresholds =
                parse_thresholds(&raw).context("MERIT_LEVEL_THRESHOLDS must be a comma-separated list of integers")?;
        }

        Ok(Config { bind_addr, engine })
    }
}

/// Parse a comma-separated threshold list, e.g. `"0,100,500"`.
fn parse_thresholds(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid threshold '{part}'"))
        })
        .collect()
}
