use crate::{
    database::{
        db_structs::{PlayerRatingState, RatingVote},
        error::StoreError,
        store::{RatingStore, VoteApplication}
    },
    model::{
        error::GradingError,
        ladder::GradeLadder,
        policy::RatingPolicy,
        structures::rating_transition::{LadderBoundary, RatingOutcome, RatingTransition},
        vote_value::vote_steps
    }
};
use chrono::{DateTime, Utc};

/// # Applying a vote
///
/// - A vote worth 0 steps leaves the state untouched (`Unchanged`).
/// - Going above the maximum moves the player to the next tier and resets the value
///   according to the policy (`Upgraded`). On the last tier the value is clamped to
///   the maximum instead (`Updated`, ceiling boundary).
/// - Going below the minimum mirrors this with the previous tier (`Downgraded`), or a
///   clamp to the minimum on the first tier (`Updated`, floor boundary).
/// - Otherwise the value simply moves (`Updated`).
pub fn rating_step(
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    state: &PlayerRatingState,
    vote_value: f64,
    now: DateTime<Utc>
) -> Result<RatingTransition, GradingError> {
    let steps = vote_steps(vote_value);
    if steps == 0 {
        return Ok(RatingTransition::unchanged(state));
    }

    let tier = state.tier(ladder)?;
    let total = state.value.saturating_add(steps);

    let (after, outcome, boundary) = if total > policy.max_value {
        match ladder.next(tier) {
            Some(next) => (
                state.with_tier(next, policy.value_after_upgrade(), now),
                RatingOutcome::Upgraded,
                None
            ),
            None => (
                state.with_tier(tier, policy.max_value, now),
                RatingOutcome::Updated,
                Some(LadderBoundary::Ceiling)
            )
        }
    } else if total < policy.min_value {
        match ladder.previous(tier) {
            Some(previous) => (
                state.with_tier(previous, policy.value_after_downgrade(), now),
                RatingOutcome::Downgraded,
                None
            ),
            None => (
                state.with_tier(tier, policy.min_value, now),
                RatingOutcome::Updated,
                Some(LadderBoundary::Floor)
            )
        }
    } else {
        (state.with_tier(tier, total, now), RatingOutcome::Updated, None)
    };

    Ok(RatingTransition {
        before: state.clone(),
        after,
        outcome,
        boundary
    })
}

/// Applies one vote to the rated player's stored rating and marks it counted,
/// atomically. A vote that is already counted is reported and left alone.
pub async fn update_player_rating<S: RatingStore + ?Sized>(
    store: &S,
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    vote: &RatingVote,
    now: DateTime<Utc>
) -> Result<VoteApplication, StoreError> {
    let value = vote.value;

    store
        .apply_vote(vote, &|state: &PlayerRatingState| {
            rating_step(ladder, policy, state, value, now)
        })
        .await
}
