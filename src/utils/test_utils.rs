use crate::{
    database::db_structs::{NewRatingVote, PlayerRatingState, RatingVote},
    model::structures::{event_kind::EventRef, grade_tier::parse_code}
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Rating state for a tier code such as `M:2`. Panics on a malformed code.
pub fn generate_rating_state(player_id: i32, code: &str, value: i32, updated_at: DateTime<Utc>) -> PlayerRatingState {
    let (grade, level_mark) = parse_code(code).unwrap_or_else(|_| panic!("Invalid tier code {}", code));

    PlayerRatingState {
        player_id,
        grade,
        level_mark,
        value,
        updated_at
    }
}

pub fn generate_vote(id: i32, rater_id: i32, rated_id: i32, value: f64, created_at: DateTime<Utc>) -> RatingVote {
    RatingVote {
        id,
        rater_id,
        rated_id,
        event: EventRef::game(1),
        value,
        created_at,
        is_counted: false
    }
}

pub fn generate_new_vote(rater_id: i32, rated_id: i32, value: f64, created_at: DateTime<Utc>) -> NewRatingVote {
    NewRatingVote {
        rater_id,
        rated_id,
        event: EventRef::game(1),
        value,
        created_at
    }
}

/// Reproducible random votes between players `1..=n_players`, one second apart,
/// with values drawn from the coefficient range. Nobody votes for themselves and
/// every vote refers to its own game.
pub fn generate_random_votes(n_players: i32, n_votes: usize, seed: u64, start: DateTime<Utc>) -> Vec<NewRatingVote> {
    if n_players < 2 {
        panic!("At least two players are needed to vote");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values = [-3.0, -2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0, 3.0];

    (0..n_votes)
        .map(|i| {
            let rater_id = rng.random_range(1..=n_players);
            let mut rated_id = rng.random_range(1..=n_players);
            while rated_id == rater_id {
                rated_id = rng.random_range(1..=n_players);
            }

            NewRatingVote {
                rater_id,
                rated_id,
                event: EventRef::game(i as i32 + 1),
                value: values[rng.random_range(0..values.len())],
                created_at: start + Duration::seconds(i as i64)
            }
        })
        .collect()
}
