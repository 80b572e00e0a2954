//! Invariant and end-to-end test suite for the Merit engine.
//!
//! This crate exercises the reputation invariants across the crate seams:
//! sum consistency, non-negativity, monotonic leveling, and achievement
//! permanence, under both sequential and concurrent callers.

pub mod helpers;
