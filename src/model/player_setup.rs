use crate::{
    database::{db_structs::PlayerRatingState, error::StoreError, store::RatingStore},
    model::{ladder::GradeLadder, policy::RatingPolicy, structures::grade::Grade}
};
use chrono::{DateTime, Utc};
use tracing::info;

/// Rating a player starts with: level 2 of the declared grade (LIGHT if none) at the baseline value.
pub fn initial_rating_state(
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    player_id: i32,
    declared_grade: Option<Grade>,
    now: DateTime<Utc>
) -> PlayerRatingState {
    let tier = ladder.default_tier(declared_grade);

    PlayerRatingState {
        player_id,
        grade: tier.grade,
        level_mark: tier.level,
        value: policy.baseline,
        updated_at: now
    }
}

/// Creates the rating of a newly registered player.
pub async fn initialize_player_rating<S: RatingStore + ?Sized>(
    store: &S,
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    player_id: i32,
    declared_grade: Option<Grade>,
    now: DateTime<Utc>
) -> Result<PlayerRatingState, StoreError> {
    let state = initial_rating_state(ladder, policy, player_id, declared_grade, now);
    store.create_rating(&state).await?;

    info!(player_id, tier = %state.code(), "Created player rating");
    Ok(state)
}
