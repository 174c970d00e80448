use crate::model::error::GradingError;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{convert::TryFrom, str::FromStr};
use strum_macros::EnumIter;

/// A player's assessment of another player after a shared event.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(i8)]
pub enum VoteDirection {
    Down = -1,
    Confirm = 0,
    Up = 1
}

impl VoteDirection {
    pub fn sign(self) -> f64 {
        match self {
            VoteDirection::Down => -1.0,
            VoteDirection::Confirm => 0.0,
            VoteDirection::Up => 1.0
        }
    }
}

impl TryFrom<i32> for VoteDirection {
    type Error = GradingError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(VoteDirection::Down),
            0 => Ok(VoteDirection::Confirm),
            1 => Ok(VoteDirection::Up),
            _ => Err(GradingError::InvalidDirection(v.to_string()))
        }
    }
}

impl FromStr for VoteDirection {
    type Err = GradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(VoteDirection::Up),
            "CONFIRM" => Ok(VoteDirection::Confirm),
            "DOWN" => Ok(VoteDirection::Down),
            _ => Err(GradingError::InvalidDirection(s.to_string()))
        }
    }
}
