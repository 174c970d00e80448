use super::{
    db_structs::{NewRatingVote, PlayerRatingState, RatingVote},
    error::StoreError
};
use crate::model::{error::GradingError, structures::{event_kind::EventRef, rating_transition::RatingTransition}};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Computes the next rating of a player from the locked current one.
pub type RatingStep<'a> = dyn Fn(&PlayerRatingState) -> Result<RatingTransition, GradingError> + Send + Sync + 'a;

/// Returns the downgraded rating, or `None` when the locked state no longer qualifies.
pub type DowngradeStep<'a> = dyn Fn(&PlayerRatingState) -> Option<PlayerRatingState> + Send + Sync + 'a;

#[derive(Debug, Clone, PartialEq)]
pub enum VoteApplication {
    Applied(RatingTransition),
    /// Another run counted the vote first; nothing was written.
    AlreadyCounted
}

/// Rating and vote persistence used by the engine.
///
/// `apply_vote` and `apply_downgrade` run the step while holding the player's rating
/// exclusively, and persist all of their writes or none of them.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Ids of all players that have a rating.
    async fn player_ids(&self) -> Result<Vec<i32>, StoreError>;

    async fn rating(&self, player_id: i32) -> Result<Option<PlayerRatingState>, StoreError>;

    /// Fails with [`StoreError::RatingExists`] if the player already has a rating.
    async fn create_rating(&self, state: &PlayerRatingState) -> Result<(), StoreError>;

    /// Uncounted votes ordered by creation time, then id.
    async fn pending_votes(&self) -> Result<Vec<RatingVote>, StoreError>;

    /// Runs `step` on the rated player's rating, writes the new state when it changed
    /// and marks the vote counted.
    async fn apply_vote(&self, vote: &RatingVote, step: &RatingStep<'_>) -> Result<VoteApplication, StoreError>;

    /// Ratings last updated before `cutoff`.
    async fn stale_ratings(&self, cutoff: DateTime<Utc>) -> Result<Vec<PlayerRatingState>, StoreError>;

    /// Whether the player took part in any event starting at or after `since`.
    async fn was_active_since(&self, player_id: i32, since: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Returns `(before, after)` when the step produced a new state.
    async fn apply_downgrade(
        &self,
        player_id: i32,
        step: &DowngradeStep<'_>
    ) -> Result<Option<(PlayerRatingState, PlayerRatingState)>, StoreError>;

    async fn participated(&self, player_id: i32, event: EventRef) -> Result<bool, StoreError>;

    /// Every vote `rater_id` gave to `rated_id`, oldest first.
    async fn votes_for_pair(&self, rater_id: i32, rated_id: i32) -> Result<Vec<RatingVote>, StoreError>;

    /// At most one vote per rater, rated player and event; a second one fails with
    /// [`StoreError::DuplicateVote`].
    async fn insert_vote(&self, vote: &NewRatingVote) -> Result<RatingVote, StoreError>;
}
