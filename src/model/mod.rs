use crate::database::{
    db_structs::{PlayerRatingState, RatingVote},
    error::StoreError,
    store::{RatingStore, VoteApplication}
};
use chrono::{DateTime, Utc};

use self::{
    coefficients::CoefficientTable,
    error::GradingError,
    inactivity::DowngradeReport,
    ladder::GradeLadder,
    policy::RatingPolicy,
    rating_processor::{BatchOptions, RatingReport},
    structures::vote_direction::VoteDirection
};

pub mod ballot;
pub mod coefficients;
pub mod constants;
pub mod error;
pub mod inactivity;
pub mod ladder;
pub mod player_setup;
pub mod policy;
pub mod rating_processor;
pub mod rating_updater;
pub mod structures;
pub mod vote_value;

/// The grading engine: ladder, coefficients and rating policy, built once and shared.
///
/// Everything here is read-only after [`GradeSystem::setup`]; the only mutable
/// state lives behind the [`RatingStore`].
#[derive(Debug, Clone)]
pub struct GradeSystem {
    pub ladder: GradeLadder,
    pub coefficients: CoefficientTable,
    pub policy: RatingPolicy
}

impl Default for GradeSystem {
    fn default() -> Self {
        Self::setup()
    }
}

impl GradeSystem {
    pub fn setup() -> Self {
        Self::with_policy(RatingPolicy::default())
    }

    pub fn with_policy(policy: RatingPolicy) -> Self {
        GradeSystem {
            ladder: GradeLadder::setup(),
            coefficients: CoefficientTable::default(),
            policy
        }
    }

    /// Signed value of a vote between two players in their current tiers.
    pub fn get_value(
        &self,
        rater: &PlayerRatingState,
        rated: &PlayerRatingState,
        direction: VoteDirection
    ) -> Result<f64, GradingError> {
        Ok(vote_value::vote_value(
            &self.coefficients,
            rater.tier(&self.ladder)?,
            rated.tier(&self.ladder)?,
            direction
        ))
    }

    pub async fn update_player_rating<S: RatingStore + ?Sized>(
        &self,
        store: &S,
        vote: &RatingVote
    ) -> Result<VoteApplication, StoreError> {
        rating_updater::update_player_rating(store, &self.ladder, &self.policy, vote, Utc::now()).await
    }

    pub async fn update_players_rating<S: RatingStore + ?Sized>(
        &self,
        store: &S,
        options: &BatchOptions
    ) -> Result<RatingReport, StoreError> {
        rating_processor::update_players_rating(store, &self.ladder, &self.policy, options).await
    }

    pub async fn downgrade_inactive_players<S: RatingStore + ?Sized>(
        &self,
        store: &S,
        days: i64,
        now: DateTime<Utc>
    ) -> Result<DowngradeReport, StoreError> {
        inactivity::downgrade_inactive_players(store, &self.policy, days, now).await
    }
}
