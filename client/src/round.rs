use mines_common::models::RoundState;
use mines_common::protocol::MoveResponse;
use tracing::{debug, info, warn};

/// The board is a fixed 5x5 grid, index-addressed 0..24.
pub const BOARD_CELLS: usize = 25;
/// At least one cell must stay safe, so the mine count caps at 24.
pub const MAX_MINES: usize = 24;
/// Fixed payout factor for a round won at the maximum mine count. The server
/// computes real multipliers; this constant only covers the special-cased
/// all-but-one-mine board.
pub const MAX_MINES_MULTIPLIER: f64 = 24.0;

/// Render status of one board cell. Cells only ever move from `Empty` to one
/// of the revealed statuses, never back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CellStatus {
    #[default]
    Empty,
    Clicked,
    /// Same rendering as `Clicked`; kept because the wire model distinguishes
    /// the two.
    Safe,
    Mine,
}

impl CellStatus {
    pub fn is_revealed(&self) -> bool {
        !matches!(self, CellStatus::Empty)
    }
}

/// Always exactly 25 cells, by construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board([CellStatus; BOARD_CELLS]);

impl Board {
    pub fn get(&self, index: usize) -> Option<CellStatus> {
        self.0.get(index).copied()
    }

    pub fn cells(&self) -> &[CellStatus; BOARD_CELLS] {
        &self.0
    }

    pub fn reset(&mut self) {
        self.0 = [CellStatus::Empty; BOARD_CELLS];
    }

    /// Rebuild the board from the server's authoritative position lists.
    /// Mine positions are only painted on a lost round; they are a display
    /// augmentation, not new game data.
    fn apply_response(&mut self, revealed: &[usize], mines: &[usize], lost: bool) {
        self.reset();
        for &pos in revealed {
            if let Some(cell) = self.0.get_mut(pos) {
                *cell = CellStatus::Clicked;
            }
        }
        if lost {
            for &pos in mines {
                if let Some(cell) = self.0.get_mut(pos) {
                    *cell = CellStatus::Mine;
                }
            }
        }
    }
}

/// One tagged status instead of independent `is_game_over`/`is_win`/
/// `is_cash_out` booleans, so contradictory combinations cannot be
/// represented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundStatus {
    #[default]
    Idle,
    Active,
    Won,
    Lost,
    CashedOut,
}

impl RoundStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RoundStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundStatus::Won | RoundStatus::Lost | RoundStatus::CashedOut)
    }
}

/// Client-side snapshot of one round, replaced wholesale on every server
/// response.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub status: RoundStatus,
    pub multiplier: f64,
    pub game_id: Option<String>,
    pub cashout_amount: Option<f64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            board: Board::default(),
            status: RoundStatus::Idle,
            multiplier: 1.0,
            game_id: None,
            cashout_amount: None,
        }
    }
}

/// Tag handed out when a move is issued; a response is only applied if its
/// ticket still names the active round and is the latest one issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveTicket {
    game_id: String,
    ordinal: u64,
}

impl MoveTicket {
    pub fn game_id(&self) -> &str {
        &self.game_id
    }
}

/// Terminal transition summary, consumed by the session layer for payout
/// banners and forced navigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundEnd {
    pub is_win: bool,
    pub credited: f64,
    pub balance_depleted: bool,
}

/// Result of applying a move response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveOutcome {
    /// Stale or mismatched ticket; state untouched.
    Discarded,
    /// Round continues.
    Updated,
    /// Round reached a terminal state.
    Ended(RoundEnd),
}

/// Owns the per-round `GameState` and the advisory coin balance, and
/// classifies every transition. All server responses flow through here; the
/// guards double as the concurrency fence against duplicate taps and late
/// responses.
pub struct RoundReconciler {
    state: GameState,
    balance: f64,
    bet: f64,
    mines: usize,
    issued: u64,
}

impl RoundReconciler {
    pub fn new(balance: f64) -> Self {
        Self {
            state: GameState::default(),
            balance,
            bet: 0.0,
            mines: 0,
            issued: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    /// Seed the balance from the room's starting coins or persisted storage.
    /// The balance mirrors the server ledger for display only.
    pub fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }

    /// Local precondition check, run before any network call. Insufficient
    /// coins or an out-of-range mine count never reach the server.
    pub fn check_start(&self, bet: f64, mines: usize) -> crate::Result<()> {
        if self.state.status.is_active() {
            return Err(crate::Error::InvalidInput("a round is already active".into()));
        }
        if bet <= 0.0 {
            return Err(crate::Error::InvalidInput("bet must be positive".into()));
        }
        if bet > self.balance {
            return Err(crate::Error::InvalidInput(format!(
                "bet {} exceeds balance {}",
                bet, self.balance
            )));
        }
        if mines > MAX_MINES {
            return Err(crate::Error::InvalidInput(format!(
                "mine count {mines} exceeds maximum {MAX_MINES}"
            )));
        }
        Ok(())
    }

    /// Apply a successful round start: fresh all-empty board, multiplier 1.0,
    /// bet debited from the balance.
    pub fn round_started(&mut self, game_id: String, bet: f64, mines: usize) {
        info!("Round {} started: bet {} with {} mines", game_id, bet, mines);
        self.state = GameState {
            status: RoundStatus::Active,
            game_id: Some(game_id),
            ..GameState::default()
        };
        self.balance -= bet;
        self.bet = bet;
        self.mines = mines;
        self.issued = 0;
    }

    /// Guard for a cell tap. Returns a ticket only when the tap is valid:
    /// active round with a known id, index in range, cell still unrevealed.
    /// Everything else is a silent no-op, which is what prevents duplicate
    /// taps on the same or already-resolved cell.
    pub fn begin_move(&mut self, index: usize) -> Option<MoveTicket> {
        if !self.state.status.is_active() {
            debug!("Ignoring tap on cell {}: no active round", index);
            return None;
        }
        let game_id = self.state.game_id.clone()?;
        if self.state.board.get(index)? != CellStatus::Empty {
            debug!("Ignoring tap on already revealed cell {}", index);
            return None;
        }

        self.issued += 1;
        Some(MoveTicket {
            game_id,
            ordinal: self.issued,
        })
    }

    /// Merge the server's move response. The ticket must still name the
    /// active round and be the latest issued, otherwise the response is
    /// discarded untouched.
    pub fn apply_move(&mut self, ticket: &MoveTicket, response: &MoveResponse) -> MoveOutcome {
        if !self.state.status.is_active()
            || self.state.game_id.as_deref() != Some(ticket.game_id.as_str())
            || ticket.ordinal != self.issued
        {
            warn!(
                "Discarding stale move response for round {} (ordinal {})",
                ticket.game_id, ticket.ordinal
            );
            return MoveOutcome::Discarded;
        }

        let lost = response.game_state == RoundState::Lost;
        self.state
            .board
            .apply_response(&response.revealed, &response.mines, lost);
        self.state.multiplier = response.multiplier;

        match response.game_state {
            RoundState::InProgress => MoveOutcome::Updated,
            RoundState::Won => match self.end_round(true) {
                Some(end) => MoveOutcome::Ended(end),
                None => MoveOutcome::Updated,
            },
            RoundState::Lost => match self.end_round(false) {
                Some(end) => MoveOutcome::Ended(end),
                None => MoveOutcome::Updated,
            },
        }
    }

    /// Apply a confirmed cashout: terminal, board reset, balance credited by
    /// the server-computed amount.
    pub fn apply_cashout(&mut self, amount: f64) -> Option<RoundEnd> {
        if !self.state.status.is_active() || self.state.game_id.is_none() {
            return None;
        }

        info!("Round cashed out for {}", amount);
        self.balance += amount;
        self.state.status = RoundStatus::CashedOut;
        self.state.cashout_amount = Some(amount);
        self.state.board.reset();
        self.state.game_id = None;

        Some(RoundEnd {
            is_win: true,
            credited: amount,
            balance_depleted: self.balance <= 0.0,
        })
    }

    /// Terminal transition, fired by a server-signaled win/loss or by session
    /// timer expiry. A win credits `bet * multiplier`, except at the maximum
    /// mine count where the fixed constant applies; a lost round keeps the
    /// bet debited at start. Returns `None` when no round is active, so a
    /// late timer cannot end a round twice.
    pub fn end_round(&mut self, is_win: bool) -> Option<RoundEnd> {
        if !self.state.status.is_active() {
            return None;
        }

        let credited = if is_win {
            let payout = if self.mines == MAX_MINES {
                self.bet * MAX_MINES_MULTIPLIER
            } else {
                self.bet * self.state.multiplier
            };
            self.balance += payout;
            payout
        } else {
            0.0
        };

        self.state.status = if is_win {
            RoundStatus::Won
        } else {
            RoundStatus::Lost
        };

        info!(
            "Round ended ({}), credited {}, balance now {}",
            if is_win { "win" } else { "loss" },
            credited,
            self.balance
        );

        Some(RoundEnd {
            is_win,
            credited,
            balance_depleted: self.balance <= 0.0,
        })
    }

    /// Terminal to idle: clear the board and round identity, ready for the
    /// next `round_started`.
    pub fn reset_round(&mut self) {
        if self.state.status.is_terminal() {
            self.state = GameState::default();
        }
    }
}
