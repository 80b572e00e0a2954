//! Threshold-based level computation.
//!
//! A [`LevelTable`] is an ordered list of non-decreasing score cutoffs;
//! index position = level − 1. `level_for(score)` counts cutoffs at or
//! below the score, with a minimum of 1, so scores below the first cutoff
//! are level 1 and scores beyond the last cutoff stay at [`LevelTable::max_level`]
//! (closed, finite progression). Pure and deterministic; the table is
//! injected configuration, validated once at construction.

use crate::constants::DEFAULT_LEVEL_THRESHOLDS;
use crate::error::ConfigError;

/// Validated, ordered sequence of level thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    thresholds: Vec<u64>,
}

impl LevelTable {
    /// Build a table from raw thresholds.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyThresholds`] if the list is empty
    /// - [`ConfigError::DecreasingThresholds`] at the first out-of-order index
    pub fn new(thresholds: Vec<u64>) -> Result<Self, ConfigError> {
        if thresholds.is_empty() {
            return Err(ConfigError::EmptyThresholds);
        }
        for (index, pair) in thresholds.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(ConfigError::DecreasingThresholds { index: index + 1 });
            }
        }
        Ok(Self { thresholds })
    }

    /// Level for a cumulative score: count of thresholds ≤ score, min 1.
    pub fn level_for(&self, score: u64) -> u64 {
        let level = self.thresholds.partition_point(|&t| t <= score) as u64;
        level.max(1)
    }

    /// Highest reachable level (table length).
    pub fn max_level(&self) -> u64 {
        self.thresholds.len() as u64
    }

    /// The raw cutoffs, in order.
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// Progress from the current level floor toward the next cutoff.
    pub fn progress_toward_next(&self, score: u64) -> LevelProgress {
        let reached = self.thresholds.partition_point(|&t| t <= score);
        let level = (reached as u64).max(1);
        // Below the first cutoff the clamped level 1 starts at score 0.
        let floor = if reached == 0 { 0 } else { self.thresholds[reached - 1] };
        let next = self.thresholds.get(level as usize).copied();
        let percent = match next {
            // `next > score >= floor` by construction, so the span is nonzero.
            // u128 intermediate to avoid overflow for very large cutoffs.
            Some(next) => ((score - floor) as u128 * 100 / (next - floor) as u128) as u8,
            None => 100,
        };
        LevelProgress { level, current_floor: floor, next_threshold: next, percent }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self { thresholds: DEFAULT_LEVEL_THRESHOLDS.to_vec() }
    }
}

/// Derived progress-toward-next-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    /// Current level, 1-based.
    pub level: u64,
    /// Cutoff at which the current level began.
    pub current_floor: u64,
    /// Cutoff for the next level, or `None` at the final tier.
    pub next_threshold: Option<u64>,
    /// Whole-number percentage toward the next cutoff (100 at max level).
    pub percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> LevelTable {
        LevelTable::default()
    }

    #[test]
    fn empty_table_rejected() {
        assert_eq!(LevelTable::new(vec![]), Err(ConfigError::EmptyThresholds));
    }

    #[test]
    fn decreasing_table_rejected() {
        let err = LevelTable::new(vec![0, 100, 50]).unwrap_err();
        assert_eq!(err, ConfigError::DecreasingThresholds { index: 2 });
    }

    #[test]
    fn equal_adjacent_thresholds_allowed() {
        assert!(LevelTable::new(vec![0, 100, 100, 500]).is_ok());
    }

    #[test]
    fn zero_score_is_level_one() {
        assert_eq!(table().level_for(0), 1);
    }

    #[test]
    fn score_below_first_threshold_is_level_one() {
        let t = LevelTable::new(vec![50, 100]).unwrap();
        assert_eq!(t.level_for(0), 1);
        assert_eq!(t.level_for(49), 1);
    }

    #[test]
    fn level_boundaries_are_inclusive() {
        let t = table();
        assert_eq!(t.level_for(99), 1);
        assert_eq!(t.level_for(100), 2);
        assert_eq!(t.level_for(499), 2);
        assert_eq!(t.level_for(500), 3);
    }

    #[test]
    fn level_caps_at_table_length() {
        let t = table();
        assert_eq!(t.level_for(100_000), 10);
        assert_eq!(t.level_for(u64::MAX), 10);
        assert_eq!(t.max_level(), 10);
    }

    #[test]
    fn progress_mid_tier() {
        let p = table().progress_toward_next(50);
        assert_eq!(p.level, 1);
        assert_eq!(p.current_floor, 0);
        assert_eq!(p.next_threshold, Some(100));
        assert_eq!(p.percent, 50);
    }

    #[test]
    fn progress_below_first_cutoff_counts_from_zero() {
        let t = LevelTable::new(vec![50, 100]).unwrap();
        let p = t.progress_toward_next(25);
        assert_eq!(p.level, 1);
        assert_eq!(p.current_floor, 0);
        assert_eq!(p.next_threshold, Some(100));
        assert_eq!(p.percent, 25);
    }

    #[test]
    fn progress_at_max_level() {
        let p = table().progress_toward_next(2_000_000);
        assert_eq!(p.level, 10);
        assert_eq!(p.next_threshold, None);
        assert_eq!(p.percent, 100);
    }

    proptest! {
        #[test]
        fn level_is_monotonic(mut cutoffs in prop::collection::vec(0u64..1_000_000, 1..16), a in 0u64..2_000_000, b in 0u64..2_000_000) {
            cutoffs.sort_unstable();
            let t = LevelTable::new(cutoffs).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.level_for(lo) <= t.level_for(hi));
        }

        #[test]
        fn level_is_deterministic(score in 0u64..2_000_000) {
            let t = LevelTable::default();
            prop_assert_eq!(t.level_for(score), t.level_for(score));
        }

        #[test]
        fn level_stays_within_bounds(score in 0u64..u64::MAX) {
            let t = LevelTable::default();
            let level = t.level_for(score);
            prop_assert!(level >= 1 && level <= t.max_level());
        }
    }
}
