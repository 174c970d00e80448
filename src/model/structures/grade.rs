use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Top-level skill category of a player, ordered from weakest to strongest.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, Display, IntoStaticStr
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Grade {
    Light = 0,
    Medium = 1,
    Hard = 2,
    Pro = 3
}

impl Grade {
    /// Zero-based position of the grade, used to index the ladder and the coefficient table.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Single letter used in tier codes, e.g. `L` in `L:1`.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Grade::Light => "L",
            Grade::Medium => "M",
            Grade::Hard => "H",
            Grade::Pro => "P"
        }
    }

    pub fn from_abbreviation(abbreviation: &str) -> Option<Grade> {
        match abbreviation {
            "L" => Some(Grade::Light),
            "M" => Some(Grade::Medium),
            "H" => Some(Grade::Hard),
            "P" => Some(Grade::Pro),
            _ => None
        }
    }
}
