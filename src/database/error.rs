use crate::model::{error::GradingError, structures::event_kind::EventRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("No rating exists for player {0}")]
    RatingNotFound(i32),

    #[error("A rating already exists for player {0}")]
    RatingExists(i32),

    #[error("Vote {0} does not exist")]
    VoteNotFound(i32),

    #[error("Player {rater_id} already rated player {rated_id} for {event:?}")]
    DuplicateVote { rater_id: i32, rated_id: i32, event: EventRef },

    #[error("Malformed {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("Rating step rejected the stored state: {0}")]
    Grading(#[from] GradingError)
}
