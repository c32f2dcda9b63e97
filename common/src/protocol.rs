use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Role, RoundState};

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub role: Role,
}

/// Room metadata returned when joining, the anchor for the session countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub owner: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "timeoutMinutes")]
    pub timeout_minutes: i64,
    pub coins: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameRequest {
    #[serde(rename = "betAmount")]
    pub bet_amount: f64,
    #[serde(rename = "numMines")]
    pub num_mines: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "gameId")]
    pub game_id: String,
    #[serde(rename = "move")]
    pub cell: usize,
}

/// Full authoritative round snapshot after a move. `mines` is only populated
/// on a lost round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub id: String,
    pub revealed: Vec<usize>,
    #[serde(rename = "gameState")]
    pub game_state: RoundState,
    #[serde(default)]
    pub mines: Vec<usize>,
    pub multiplier: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CashoutResponse {
    #[serde(rename = "cashoutAmount")]
    pub cashout_amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_response_without_mines_defaults_to_empty() {
        let json = r#"{
            "id": "g-1",
            "revealed": [0, 7],
            "gameState": "IN_PROGRESS",
            "multiplier": 1.08
        }"#;

        let response: MoveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.game_state, RoundState::InProgress);
        assert!(response.mines.is_empty());
        assert_eq!(response.revealed, vec![0, 7]);
    }

    #[test]
    fn lost_move_response_carries_mine_positions() {
        let json = r#"{
            "id": "g-1",
            "revealed": [0],
            "gameState": "LOST",
            "mines": [4, 9, 17],
            "multiplier": 1.08
        }"#;

        let response: MoveResponse = serde_json::from_str(json).unwrap();
        assert!(response.game_state.is_terminal());
        assert_eq!(response.mines, vec![4, 9, 17]);
    }

    #[test]
    fn join_room_response_parses_server_timestamp() {
        let json = r#"{
            "owner": "alice",
            "createdAt": "2025-01-05T12:00:00Z",
            "timeoutMinutes": 30,
            "coins": 500.0
        }"#;

        let response: JoinRoomResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.timeout_minutes, 30);
        assert_eq!(response.coins, 500.0);
    }
}
