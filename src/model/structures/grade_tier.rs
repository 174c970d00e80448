use super::grade::Grade;
use crate::model::error::GradingError;
use serde::Serialize;
use std::fmt;

/// One (grade, level) rung of the ladder.
///
/// Neighbors are stored as positions into the owning [`GradeLadder`](crate::model::ladder::GradeLadder)
/// rather than references, so tiers are plain `Copy` values.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradeTier {
    pub grade: Grade,
    pub level: u8,
    pub position: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>
}

impl GradeTier {
    /// Unique tier code, e.g. `M:2`.
    pub fn code(&self) -> String {
        format_code(self.grade, self.level)
    }

    pub fn grade_level(&self) -> (Grade, u8) {
        (self.grade, self.level)
    }

    pub fn is_first(&self) -> bool {
        self.previous.is_none()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

impl fmt::Display for GradeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.grade.abbreviation(), self.level)
    }
}

pub fn format_code(grade: Grade, level: u8) -> String {
    format!("{}:{}", grade.abbreviation(), level)
}

/// Splits a tier code such as `H:3` into its grade and level.
/// The level is not range-checked here; the ladder decides whether the tier exists.
pub fn parse_code(code: &str) -> Result<(Grade, u8), GradingError> {
    let (abbreviation, level) = code
        .split_once(':')
        .ok_or_else(|| GradingError::InvalidTierCode(code.to_string()))?;

    let grade = Grade::from_abbreviation(abbreviation).ok_or_else(|| GradingError::InvalidTierCode(code.to_string()))?;
    let level = level
        .parse::<u8>()
        .map_err(|_| GradingError::InvalidTierCode(code.to_string()))?;

    Ok((grade, level))
}
