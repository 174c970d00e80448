use crate::database::db_structs::PlayerRatingState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GradeChangeKind {
    Upgrade,
    Downgrade,
    Inactivity
}

/// A tier change of one player, reported by the rating batch and the inactivity sweep.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeChange {
    pub player_id: i32,
    pub kind: GradeChangeKind,
    pub previous_code: String,
    pub current_code: String,
    pub changed_at: DateTime<Utc>
}

impl GradeChange {
    pub fn new(kind: GradeChangeKind, before: &PlayerRatingState, after: &PlayerRatingState) -> Self {
        GradeChange {
            player_id: after.player_id,
            kind,
            previous_code: before.code(),
            current_code: after.code(),
            changed_at: after.updated_at
        }
    }
}
