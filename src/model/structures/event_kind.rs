use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The kind of event a vote or a participation refers to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    Game,
    Tourney
}

/// Reference to a game or tourney.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventRef {
    pub kind: EventKind,
    pub id: i32
}

impl EventRef {
    pub fn game(id: i32) -> Self {
        EventRef {
            kind: EventKind::Game,
            id
        }
    }

    pub fn tourney(id: i32) -> Self {
        EventRef {
            kind: EventKind::Tourney,
            id
        }
    }
}
