use mines_common::models::{LeaderboardEntry, Role, RoomDetails};
use mines_common::protocol::{
    CashoutResponse, CreateRoomResponse, JoinRoomResponse, LoginRequest, LoginResponse,
    MoveRequest, MoveResponse, RegisterRequest, StartGameRequest, StartGameResponse,
    WhoamiResponse,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::{Error, Result};

/// HTTP adapter for the mines room server API.
///
/// Every game-authoritative decision lives on the server; this type only
/// issues the calls and decodes the payloads. The bearer token is injected by
/// the caller rather than read from ambient storage so tests can construct a
/// client without a device environment.
pub struct MinesClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl MinesClient {
    /// Create a new client connecting to the specified server URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::new();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Attach the bearer token used for all authenticated calls.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| Error::Unauthorized("no bearer token available".into()))?;
        Ok(request.bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("Server rejected request ({}): {}", status, message);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized(message)),
            _ => Err(Error::Server {
                status: status.as_u16(),
                message,
            }),
        }
    }

    /// Log in and return the bearer token plus canonical username.
    pub async fn login(&self, name: &str, password: &str) -> Result<LoginResponse> {
        let url = self.endpoint("auth/login")?;
        let body = LoginRequest {
            name: name.to_string(),
            password: password.to_string(),
        };

        let response = self.client.post(url).json(&body).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn register(&self, name: &str, password: &str, role: Role) -> Result<()> {
        let url = self.endpoint("auth/register")?;
        let body = RegisterRequest {
            name: name.to_string(),
            password: password.to_string(),
            role,
        };

        let response = self.client.post(url).json(&body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Join a room and return its metadata (owner, creation timestamp,
    /// timeout, starting coins).
    pub async fn join_room(&self, room_code: &str) -> Result<JoinRoomResponse> {
        debug!("Joining room {}", room_code);
        let url = self.endpoint(&format!("rooms/{room_code}/join"))?;

        let request = self.authorized(self.client.post(url))?;
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_room(&self, timeout_minutes: u32, coins: f64) -> Result<String> {
        let mut url = self.endpoint("admin/create-room")?;
        url.query_pairs_mut()
            .append_pair("timeoutMinutes", &timeout_minutes.to_string())
            .append_pair("coins", &coins.to_string());

        let request = self.authorized(self.client.post(url))?;
        let response = request.send().await?;
        let created: CreateRoomResponse = Self::check(response).await?.json().await?;
        Ok(created.code)
    }

    /// Start a round. Returns the opaque round identifier used for all
    /// subsequent moves.
    pub async fn start_game(
        &self,
        bet_amount: f64,
        num_mines: usize,
        room_code: &str,
    ) -> Result<String> {
        debug!(
            "Starting round in {}: bet {} with {} mines",
            room_code, bet_amount, num_mines
        );
        let url = self.endpoint(&format!("rooms/{room_code}/games/start"))?;
        let body = StartGameRequest {
            bet_amount,
            num_mines,
        };

        let request = self.authorized(self.client.post(url).json(&body))?;
        let response = request.send().await?;
        let started: StartGameResponse = Self::check(response).await?.json().await?;
        Ok(started.id)
    }

    /// Reveal a cell. The server answers with the full authoritative round
    /// snapshot (revealed positions, state, mines on loss, multiplier).
    pub async fn click_box(
        &self,
        game_id: &str,
        cell: usize,
        room_code: &str,
    ) -> Result<MoveResponse> {
        debug!("Revealing cell {} in round {}", cell, game_id);
        let url = self.endpoint(&format!("rooms/{room_code}/games/move"))?;
        let body = MoveRequest {
            game_id: game_id.to_string(),
            cell,
        };

        let request = self.authorized(self.client.post(url).json(&body))?;
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Cash out an in-progress round, locking in the current multiplier.
    pub async fn cashout(&self, game_id: &str, room_code: &str) -> Result<f64> {
        debug!("Cashing out round {}", game_id);
        let url = self.endpoint(&format!("rooms/{room_code}/games/{game_id}/cashout"))?;

        let request = self.authorized(self.client.post(url))?;
        let response = request.send().await?;
        let cashed: CashoutResponse = Self::check(response).await?.json().await?;
        Ok(cashed.cashout_amount)
    }

    /// Per-room leaderboard, sorted by cashout amount descending.
    pub async fn leaderboard(&self, room_code: &str) -> Result<Vec<LeaderboardEntry>> {
        let url = self.endpoint(&format!("rooms/{room_code}/leaderboard"))?;

        let request = self.authorized(self.client.get(url))?;
        let response = request.send().await?;
        let mut entries: Vec<LeaderboardEntry> = Self::check(response).await?.json().await?;
        entries.sort_by(|a, b| b.cashout_amount.total_cmp(&a.cashout_amount));
        Ok(entries)
    }

    pub async fn room_details(&self, room_code: &str) -> Result<RoomDetails> {
        let url = self.endpoint(&format!("rooms/{room_code}/details"))?;

        let request = self.authorized(self.client.get(url))?;
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Ask the server who the token belongs to. Replaces the old
    /// fetch-all-users role scan with a direct lookup.
    pub async fn whoami(&self) -> Result<WhoamiResponse> {
        let url = self.endpoint("me")?;

        let request = self.authorized(self.client.get(url))?;
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Convenience role check on top of `whoami`.
    pub async fn is_owner_or_admin(&self) -> Result<bool> {
        Ok(self.whoami().await?.role.can_administer())
    }
}
