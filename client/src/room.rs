use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mines_common::models::LeaderboardEntry;
use mines_common::protocol::JoinRoomResponse;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::round::{GameState, MoveOutcome, RoundReconciler};
use crate::session::{Countdown, SessionClock, SessionEvent};
use crate::storage::DeviceStore;
use crate::{Error, MinesClient, Result};

/// Room codes are always six alphanumeric characters.
pub const ROOM_CODE_LEN: usize = 6;

/// Where a forced navigation sends the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitDestination {
    /// Room expired: show the final standings.
    Leaderboard,
    /// Out of coins: back to the lobby.
    Lobby,
}

/// Events emitted by a room session for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomEvent {
    RoundStarted { game_id: String },
    BoardUpdated,
    RoundEnded { is_win: bool, credited: f64 },
    CashedOut { amount: f64 },
    BalanceDepleted,
    Session(SessionEvent),
    ForcedExit { destination: ExitDestination },
}

/// Cadences for the countdown loop and the forced-navigation delay. Tests
/// shrink these so they do not have to wait in real time.
#[derive(Clone, Copy, Debug)]
pub struct SessionTimings {
    pub tick: Duration,
    pub redirect_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            redirect_delay: Duration::from_secs(3),
        }
    }
}

type EventSender = Arc<RwLock<Option<mpsc::UnboundedSender<RoomEvent>>>>;

/// High-level handle for one room visit: owns the server adapter, the round
/// reconciler and the session countdown task, and publishes `RoomEvent`s for
/// rendering. All game-authoritative decisions stay on the server; this type
/// only reconciles responses into renderable state.
pub struct RoomSession {
    client: MinesClient,
    room_code: String,
    reconciler: Arc<RwLock<RoundReconciler>>,
    countdown: Arc<RwLock<Countdown>>,
    store: Arc<RwLock<DeviceStore>>,
    event_sender: EventSender,
    timings: SessionTimings,
    timer_task: Option<JoinHandle<()>>,
}

fn validate_room_code(code: &str) -> Result<()> {
    if code.len() != ROOM_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidInput(format!(
            "room code must be {ROOM_CODE_LEN} alphanumeric characters"
        )));
    }
    Ok(())
}

impl RoomSession {
    /// Validate the room code locally, join via the server and start the
    /// session countdown. An invalid code never reaches the network.
    pub async fn join(client: MinesClient, store: DeviceStore, room_code: &str) -> Result<Self> {
        validate_room_code(room_code)?;
        let room = client.join_room(room_code).await?;
        Ok(Self::new(client, store, room_code, &room, SessionTimings::default()))
    }

    /// Build a session from already-fetched room metadata. The balance is
    /// seeded from persisted coins when present, otherwise from the room's
    /// starting amount.
    pub fn new(
        client: MinesClient,
        store: DeviceStore,
        room_code: &str,
        room: &JoinRoomResponse,
        timings: SessionTimings,
    ) -> Self {
        let balance = store.coins().unwrap_or(room.coins);
        info!(
            "Entering room {} (owner {}, {} min timeout, balance {})",
            room_code, room.owner, room.timeout_minutes, balance
        );

        let clock = SessionClock::new(room.created_at, room.timeout_minutes);
        let mut session = Self {
            client,
            room_code: room_code.to_string(),
            reconciler: Arc::new(RwLock::new(RoundReconciler::new(balance))),
            countdown: Arc::new(RwLock::new(Countdown::new(clock))),
            store: Arc::new(RwLock::new(store)),
            event_sender: Arc::new(RwLock::new(None)),
            timings,
            timer_task: None,
        };
        session.timer_task = Some(session.spawn_timer(timings));
        session
    }

    /// Subscribe to room events. Returns a receiver for the event stream.
    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<RoomEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut event_sender = self.event_sender.write().await;
        *event_sender = Some(sender);
        receiver
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub async fn game_state(&self) -> GameState {
        self.reconciler.read().await.state().clone()
    }

    pub async fn balance(&self) -> f64 {
        self.reconciler.read().await.balance()
    }

    /// Current countdown display, `00:00` once expired.
    pub async fn remaining_time(&self) -> String {
        self.countdown.read().await.clock().format_remaining(Utc::now())
    }

    /// Start a round. Preconditions (sufficient coins, mine count in range)
    /// are checked locally first; failures short-circuit without a server
    /// round-trip and leave the game state untouched.
    pub async fn start_round(&self, bet: f64, mines: usize) -> Result<GameState> {
        self.reconciler.read().await.check_start(bet, mines)?;

        let game_id = self.client.start_game(bet, mines, &self.room_code).await?;

        let state = {
            let mut reconciler = self.reconciler.write().await;
            reconciler.round_started(game_id.clone(), bet, mines);
            self.persist(&reconciler).await;
            reconciler.state().clone()
        };
        self.record_round(&game_id).await;

        self.emit(RoomEvent::RoundStarted { game_id }).await;
        Ok(state)
    }

    /// Reveal a cell. Taps on revealed cells, finished rounds or without an
    /// active round id are silent no-ops; a response that arrives after the
    /// round changed is discarded.
    pub async fn reveal(&self, index: usize) -> Result<GameState> {
        let Some(ticket) = self.reconciler.write().await.begin_move(index) else {
            return Ok(self.game_state().await);
        };

        let response = self
            .client
            .click_box(ticket.game_id(), index, &self.room_code)
            .await?;

        let (outcome, state) = {
            let mut reconciler = self.reconciler.write().await;
            let outcome = reconciler.apply_move(&ticket, &response);
            if let MoveOutcome::Ended(_) = outcome {
                self.persist(&reconciler).await;
            }
            (outcome, reconciler.state().clone())
        };

        match outcome {
            MoveOutcome::Discarded => {}
            MoveOutcome::Updated => self.emit(RoomEvent::BoardUpdated).await,
            MoveOutcome::Ended(end) => {
                self.emit(RoomEvent::BoardUpdated).await;
                self.emit(RoomEvent::RoundEnded {
                    is_win: end.is_win,
                    credited: end.credited,
                })
                .await;
                if end.balance_depleted {
                    self.emit(RoomEvent::BalanceDepleted).await;
                    self.schedule_exit(ExitDestination::Lobby).await;
                }
            }
        }

        Ok(state)
    }

    /// Cash out the active round. Returns `None` when no round is active.
    pub async fn cash_out(&self) -> Result<Option<f64>> {
        let Some(game_id) = self.reconciler.read().await.state().game_id.clone() else {
            debug!("Cash out ignored: no active round");
            return Ok(None);
        };

        let amount = self.client.cashout(&game_id, &self.room_code).await?;

        {
            let mut reconciler = self.reconciler.write().await;
            if reconciler.apply_cashout(amount).is_none() {
                return Ok(None);
            }
            self.persist(&reconciler).await;
        }

        self.emit(RoomEvent::CashedOut { amount }).await;
        Ok(Some(amount))
    }

    /// Dismiss a finished round: board back to all-empty, ready for the next
    /// bet.
    pub async fn next_round(&self) {
        self.reconciler.write().await.reset_round();
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        self.client.leaderboard(&self.room_code).await
    }

    /// Leave the room: stop the countdown task. In-flight requests are not
    /// cancelled.
    pub async fn leave(mut self) {
        if let Some(task) = self.timer_task.take() {
            task.abort();
            let _ = task.await;
        }
        *self.event_sender.write().await = None;
        info!("Left room {}", self.room_code);
    }

    async fn emit(&self, event: RoomEvent) {
        if let Some(ref sender) = *self.event_sender.read().await {
            let _ = sender.send(event);
        }
    }

    /// Persist the advisory balance. Storage failures are logged, not fatal:
    /// the in-memory balance stays correct for this session.
    async fn persist(&self, reconciler: &RoundReconciler) {
        if let Err(e) = self.store.write().await.set_coins(reconciler.balance()) {
            warn!("Failed to persist balance: {}", e);
        }
    }

    async fn record_round(&self, game_id: &str) {
        if let Err(e) = self.store.write().await.push_game_id(game_id) {
            warn!("Failed to record round id: {}", e);
        }
    }

    async fn schedule_exit(&self, destination: ExitDestination) {
        let event_sender = self.event_sender.clone();
        let delay = self.timings.redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(ref sender) = *event_sender.read().await {
                let _ = sender.send(RoomEvent::ForcedExit { destination });
            }
        });
    }

    /// Countdown loop. Ticks every second, publishes warnings and, at
    /// expiry, forces the loss transition exactly once and schedules the
    /// redirect to the leaderboard. The first tick fires immediately, so a
    /// clock that is already past its end time expires without waiting.
    fn spawn_timer(&self, timings: SessionTimings) -> JoinHandle<()> {
        let reconciler = self.reconciler.clone();
        let countdown = self.countdown.clone();
        let store = self.store.clone();
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(timings.tick);
            loop {
                interval.tick().await;

                let events = countdown.write().await.observe(Utc::now());
                for event in events {
                    let expired = event == SessionEvent::Expired;

                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(RoomEvent::Session(event.clone()));
                    }

                    if !expired {
                        continue;
                    }

                    // Forced terminal transition; end_round is a no-op when
                    // no round is active.
                    let ended = {
                        let mut reconciler = reconciler.write().await;
                        let ended = reconciler.end_round(false);
                        if ended.is_some() {
                            if let Err(e) =
                                store.write().await.set_coins(reconciler.balance())
                            {
                                warn!("Failed to persist balance: {}", e);
                            }
                        }
                        ended
                    };

                    if let Some(ref sender) = *event_sender.read().await {
                        if let Some(end) = ended {
                            let _ = sender.send(RoomEvent::RoundEnded {
                                is_win: false,
                                credited: end.credited,
                            });
                            if end.balance_depleted {
                                let _ = sender.send(RoomEvent::BalanceDepleted);
                            }
                        }
                    }

                    tokio::time::sleep(timings.redirect_delay).await;
                    if let Some(ref sender) = *event_sender.read().await {
                        let _ = sender.send(RoomEvent::ForcedExit {
                            destination: ExitDestination::Leaderboard,
                        });
                    }
                    return;
                }
            }
        })
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn test_session(created_secs_ago: i64, timeout_minutes: i64) -> (RoomSession, DeviceStore) {
        let dir = tempfile::tempdir().unwrap().keep();
        let path = dir.join("store.json");
        let store = DeviceStore::open(&path).unwrap();
        let probe = DeviceStore::open(&path).unwrap();

        let client = MinesClient::new("http://localhost:8000/")
            .unwrap()
            .with_token("jwt-test");
        let room = JoinRoomResponse {
            owner: "alice".to_string(),
            created_at: Utc::now() - ChronoDuration::seconds(created_secs_ago),
            timeout_minutes,
            coins: 100.0,
        };
        let timings = SessionTimings {
            tick: Duration::from_millis(5),
            redirect_delay: Duration::from_millis(5),
        };

        (
            RoomSession::new(client, store, "ABC123", &room, timings),
            probe,
        )
    }

    #[tokio::test]
    async fn invalid_room_code_is_rejected_before_any_call() {
        for code in ["", "12345", "1234567", "ABC12!"] {
            assert!(matches!(
                validate_room_code(code),
                Err(Error::InvalidInput(_))
            ));
        }
        assert!(validate_room_code("ABC123").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[tokio::test]
    async fn balance_is_seeded_from_room_coins() {
        let (session, _) = test_session(0, 30);
        assert_eq!(session.balance().await, 100.0);
        session.leave().await;
    }

    #[tokio::test]
    async fn expired_room_fires_expiry_and_redirect() {
        // Mounted one minute after the room already timed out.
        let (session, _) = test_session(120, 1);
        let mut events = session.subscribe_to_events().await;

        let mut saw_expired = false;
        let mut saw_redirect = false;
        for _ in 0..4 {
            match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Some(RoomEvent::Session(SessionEvent::Expired))) => saw_expired = true,
                Ok(Some(RoomEvent::ForcedExit { destination })) => {
                    assert_eq!(destination, ExitDestination::Leaderboard);
                    saw_redirect = true;
                    break;
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }

        assert!(saw_expired);
        assert!(saw_redirect);
        session.leave().await;
    }

    #[tokio::test]
    async fn remaining_time_is_clamped_after_expiry() {
        let (session, _) = test_session(120, 1);
        assert_eq!(session.remaining_time().await, "00:00");
        session.leave().await;
    }

    #[tokio::test]
    async fn leaving_aborts_the_timer_task() {
        let (session, _) = test_session(0, 30);
        session.leave().await;
    }
}
