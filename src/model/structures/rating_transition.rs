use crate::database::db_structs::PlayerRatingState;
use serde::Serialize;

/// Effect of one vote on a player's rating.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingOutcome {
    Unchanged,
    Updated,
    Upgraded,
    Downgraded
}

/// Which end of the ladder stopped a tier change.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LadderBoundary {
    Floor,
    Ceiling
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RatingTransition {
    pub before: PlayerRatingState,
    pub after: PlayerRatingState,
    pub outcome: RatingOutcome,
    /// Set when the value was clamped because the player is already at the first or last tier.
    /// The outcome is `Updated` in that case.
    pub boundary: Option<LadderBoundary>
}

impl RatingTransition {
    pub fn unchanged(state: &PlayerRatingState) -> Self {
        RatingTransition {
            before: state.clone(),
            after: state.clone(),
            outcome: RatingOutcome::Unchanged,
            boundary: None
        }
    }

    /// Whether the rating row has to be written back.
    pub fn changes_state(&self) -> bool {
        self.outcome != RatingOutcome::Unchanged
    }

    pub fn changes_tier(&self) -> bool {
        matches!(self.outcome, RatingOutcome::Upgraded | RatingOutcome::Downgraded)
    }
}
