use crate::{
    database::{
        db_structs::{NewRatingVote, RatingVote},
        error::StoreError,
        store::RatingStore
    },
    model::{
        coefficients::CoefficientTable,
        constants::{VOTE_LIMIT, VOTE_LIMIT_WINDOW_DAYS},
        error::GradingError,
        ladder::GradeLadder,
        structures::{event_kind::EventRef, vote_direction::VoteDirection},
        vote_value::vote_value
    }
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BallotError {
    #[error("Player {0} cannot rate themselves")]
    SelfRating(i32),

    #[error("Player {player_id} did not take part in {event:?}")]
    Participation { player_id: i32, event: EventRef },

    #[error("Player {rater_id} already rated player {rated_id} for {event:?}")]
    DuplicateVote { rater_id: i32, rated_id: i32, event: EventRef },

    #[error("Player {rater_id} already rated player {rated_id} {limit} times in the last {window_days} days")]
    RatingLimit {
        rater_id: i32,
        rated_id: i32,
        limit: usize,
        window_days: i64
    },

    #[error("Player {0} has no rating")]
    MissingRating(i32),

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error(transparent)]
    Store(StoreError)
}

impl From<StoreError> for BallotError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateVote { rater_id, rated_id, event } => BallotError::DuplicateVote {
                rater_id,
                rated_id,
                event
            },
            other => BallotError::Store(other)
        }
    }
}

/// A vote as submitted, before validation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub rater_id: i32,
    pub rated_id: i32,
    pub event: EventRef,
    /// `1` for up, `0` for confirm, `-1` for down
    pub direction: i32
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteLimit {
    pub max_votes: usize,
    pub window_days: i64
}

impl Default for VoteLimit {
    fn default() -> Self {
        VoteLimit {
            max_votes: VOTE_LIMIT,
            window_days: VOTE_LIMIT_WINDOW_DAYS
        }
    }
}

/// Validates a vote and stores it as pending. The value is fixed here from the
/// current tiers of both players; the rating batch applies it later.
pub async fn cast_vote<S: RatingStore + ?Sized>(
    store: &S,
    ladder: &GradeLadder,
    table: &CoefficientTable,
    limit: &VoteLimit,
    request: &VoteRequest,
    now: DateTime<Utc>
) -> Result<RatingVote, BallotError> {
    if request.rater_id == request.rated_id {
        return Err(BallotError::SelfRating(request.rater_id));
    }

    for player_id in [request.rater_id, request.rated_id] {
        if !store.participated(player_id, request.event).await? {
            return Err(BallotError::Participation {
                player_id,
                event: request.event
            });
        }
    }

    let previous = store.votes_for_pair(request.rater_id, request.rated_id).await?;

    if previous.iter().any(|v| v.event == request.event) {
        return Err(BallotError::DuplicateVote {
            rater_id: request.rater_id,
            rated_id: request.rated_id,
            event: request.event
        });
    }

    let window_start = now - Duration::days(limit.window_days);
    let recent = previous.iter().filter(|v| v.created_at >= window_start).count();
    if recent >= limit.max_votes {
        return Err(BallotError::RatingLimit {
            rater_id: request.rater_id,
            rated_id: request.rated_id,
            limit: limit.max_votes,
            window_days: limit.window_days
        });
    }

    let direction = VoteDirection::try_from(request.direction)?;

    let rater = store
        .rating(request.rater_id)
        .await?
        .ok_or(BallotError::MissingRating(request.rater_id))?;
    let rated = store
        .rating(request.rated_id)
        .await?
        .ok_or(BallotError::MissingRating(request.rated_id))?;

    let value = vote_value(table, rater.tier(ladder)?, rated.tier(ladder)?, direction);

    // A concurrent vote for the same event fails here as DuplicateVote.
    let vote = store
        .insert_vote(&NewRatingVote {
            rater_id: request.rater_id,
            rated_id: request.rated_id,
            event: request.event,
            value,
            created_at: now
        })
        .await?;

    debug!(vote_id = vote.id, rater_id = vote.rater_id, rated_id = vote.rated_id, value, "Vote recorded");
    Ok(vote)
}
