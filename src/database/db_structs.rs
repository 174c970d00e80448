use crate::model::{
    error::GradingError,
    ladder::GradeLadder,
    structures::{
        event_kind::EventRef,
        grade::Grade,
        grade_tier::{format_code, GradeTier}
    }
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted rating of one player. Only the rating batch and the inactivity sweep change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRatingState {
    pub player_id: i32,
    pub grade: Grade,
    pub level_mark: u8,
    pub value: i32,
    pub updated_at: DateTime<Utc>
}

impl PlayerRatingState {
    pub fn code(&self) -> String {
        format_code(self.grade, self.level_mark)
    }

    /// Resolves the stored grade and level to a ladder tier.
    pub fn tier<'a>(&self, ladder: &'a GradeLadder) -> Result<&'a GradeTier, GradingError> {
        ladder
            .get_by_grade_level(self.grade, self.level_mark)
            .ok_or_else(|| GradingError::UnknownTier {
                grade: self.grade.to_string(),
                level: self.level_mark as i32
            })
    }

    pub fn with_tier(&self, tier: &GradeTier, value: i32, updated_at: DateTime<Utc>) -> PlayerRatingState {
        PlayerRatingState {
            player_id: self.player_id,
            grade: tier.grade,
            level_mark: tier.level,
            value,
            updated_at
        }
    }
}

/// A player-to-player vote. Append-only until the rating batch counts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingVote {
    pub id: i32,
    pub rater_id: i32,
    pub rated_id: i32,
    pub event: EventRef,
    /// Precomputed signed delta, 0 for confirmations
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub is_counted: bool
}

/// A vote that has passed ingestion checks but has no id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRatingVote {
    pub rater_id: i32,
    pub rated_id: i32,
    pub event: EventRef,
    pub value: f64,
    pub created_at: DateTime<Utc>
}
