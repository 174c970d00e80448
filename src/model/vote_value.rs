use crate::model::{
    coefficients::CoefficientTable,
    error::GradingError,
    structures::{grade_tier::GradeTier, vote_direction::VoteDirection}
};

/// Signed rating delta of one vote. `Confirm` is always 0.
pub fn vote_value(table: &CoefficientTable, rater: &GradeTier, rated: &GradeTier, direction: VoteDirection) -> f64 {
    match direction {
        VoteDirection::Confirm => 0.0,
        VoteDirection::Up | VoteDirection::Down => direction.sign() * table.coefficient(rater.grade, rated.grade)
    }
}

/// Same as [`vote_value`] for a direction that has not been validated yet (`1`, `0` or `-1`).
pub fn raw_vote_value(table: &CoefficientTable, rater: &GradeTier, rated: &GradeTier, direction: i32) -> Result<f64, GradingError> {
    let direction = VoteDirection::try_from(direction)?;
    Ok(vote_value(table, rater, rated, direction))
}

/// Number of whole rating steps a vote moves the accumulator.
/// Halves round away from zero, so +0.5 and -0.5 each move one step.
pub fn vote_steps(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }

    value.round() as i32
}
