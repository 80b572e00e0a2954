//! # merit-core
//! Foundation types and rules for the Merit reputation engine.

pub mod achievements;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod level;
pub mod types;
