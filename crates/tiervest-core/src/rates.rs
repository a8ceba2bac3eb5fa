//! Referral commission rate configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hard cap on how many sponsor levels a commission cascade walks.
pub const MAX_REFERRAL_DEPTH: u8 = 5;

/// Direct-commission percentages per sponsor level.
///
/// Levels run 1 (immediate sponsor) through [`MAX_REFERRAL_DEPTH`]. Gaps are
/// allowed: a level with no configured rate is skipped by the cascade without
/// breaking the walk. Written only through the excluded admin surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRates {
    levels: BTreeMap<u8, i64>,
}

impl ReferralRates {
    /// Empty configuration: no commissions at any level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(level, pct_milli)` pairs. Levels outside
    /// `1..=MAX_REFERRAL_DEPTH` are ignored.
    #[must_use]
    pub fn from_pairs(pairs: &[(u8, i64)]) -> Self {
        let levels = pairs
            .iter()
            .copied()
            .filter(|(level, _)| (1..=MAX_REFERRAL_DEPTH).contains(level))
            .collect();
        Self { levels }
    }

    /// Set the rate for one level. Levels outside the cap are ignored.
    pub fn set(&mut self, level: u8, pct_milli: i64) {
        if (1..=MAX_REFERRAL_DEPTH).contains(&level) {
            self.levels.insert(level, pct_milli);
        }
    }

    /// The configured rate for a level, if any.
    #[must_use]
    pub fn rate_for(&self, level: u8) -> Option<i64> {
        self.levels.get(&level).copied()
    }

    /// Whether no level has a configured rate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
