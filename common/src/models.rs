use serde::{Deserialize, Serialize};

/// Server-side classification of an in-flight round.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum RoundState {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "WON")]
    Won,
    #[serde(rename = "LOST")]
    Lost,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundState::InProgress)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_OWNER")]
    Owner,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Room administration (create-room and friends) is restricted to these.
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LeaderboardEntry {
    #[serde(rename = "gameId")]
    pub game_id: String,
    #[serde(rename = "cashoutAmount")]
    pub cashout_amount: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct RoomPrizes {
    pub first: f64,
    pub second: f64,
    pub third: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RoomDetails {
    pub owner: String,
    #[serde(rename = "timeLimit")]
    pub time_limit: u32,
    pub prizes: RoomPrizes,
}
