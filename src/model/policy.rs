use crate::model::{
    constants::{DEFAULT_RATING, MAX_RATING_VALUE, MIN_RATING_VALUE},
    error::GradingError
};
use serde::{Deserialize, Serialize};

/// Value a player starts a new tier with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TierResetPolicy {
    /// Upgrades start at the minimum value, downgrades at the maximum.
    OppositeBoundary,
    /// Every tier change starts at the baseline value.
    Baseline
}

/// Numeric bounds of the rating accumulator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPolicy {
    pub min_value: i32,
    pub max_value: i32,
    pub baseline: i32,
    pub reset: TierResetPolicy
}

impl Default for RatingPolicy {
    fn default() -> Self {
        RatingPolicy {
            min_value: MIN_RATING_VALUE,
            max_value: MAX_RATING_VALUE,
            baseline: DEFAULT_RATING,
            reset: TierResetPolicy::OppositeBoundary
        }
    }
}

impl RatingPolicy {
    pub fn new(min_value: i32, max_value: i32, baseline: i32, reset: TierResetPolicy) -> Result<Self, GradingError> {
        if min_value >= max_value {
            return Err(GradingError::InvalidPolicy(format!(
                "minimum {} must be below maximum {}",
                min_value, max_value
            )));
        }

        if baseline < min_value || baseline > max_value {
            return Err(GradingError::InvalidPolicy(format!(
                "baseline {} is outside [{}, {}]",
                baseline, min_value, max_value
            )));
        }

        Ok(RatingPolicy {
            min_value,
            max_value,
            baseline,
            reset
        })
    }

    pub fn value_after_upgrade(&self) -> i32 {
        match self.reset {
            TierResetPolicy::OppositeBoundary => self.min_value,
            TierResetPolicy::Baseline => self.baseline
        }
    }

    pub fn value_after_downgrade(&self) -> i32 {
        match self.reset {
            TierResetPolicy::OppositeBoundary => self.max_value,
            TierResetPolicy::Baseline => self.baseline
        }
    }
}
