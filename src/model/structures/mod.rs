pub mod event_kind;
pub mod grade;
pub mod grade_change;
pub mod grade_tier;
pub mod rating_transition;
pub mod vote_direction;
