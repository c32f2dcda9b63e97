//! Mines Client Library
//!
//! This library provides a Rust client for the multiplayer mines betting
//! server: players join a time-boxed room, place a bet, reveal cells on a
//! 5x5 board while avoiding hidden mines, and cash out before a mine is hit
//! or the room timer expires. All game-authoritative decisions (mine
//! placement, move validation, payout math) stay on the server; this crate
//! reconciles server responses into renderable state.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! The `RoomSession` struct manages the round state, the coin balance and
//! the session countdown, and publishes events for rendering:
//!
//! ```rust,no_run
//! use mines_client::{DeviceStore, MinesClient, RoomEvent, RoomSession};
//!
//! #[tokio::main]
//! async fn main() -> mines_client::Result<()> {
//!     let mut store = DeviceStore::open("mines-store.json")?;
//!
//!     let client = MinesClient::new("http://localhost:8000/")?;
//!     let login = client.login("alice", "hunter2").await?;
//!     store.set_token(&login.token)?;
//!     let client = client.with_token(login.token);
//!
//!     let session = RoomSession::join(client, store, "ABC123").await?;
//!     let mut events = session.subscribe_to_events().await;
//!
//!     session.start_round(10.0, 3).await?;
//!     session.reveal(0).await?;
//!
//!     if let Some(amount) = session.cash_out().await? {
//!         println!("Cashed out {amount:.2}");
//!     }
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let RoomEvent::ForcedExit { destination } = event {
//!             println!("Leaving room: {destination:?}");
//!         }
//!     }
//!
//!     session.leave().await;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! For more control, use `MinesClient` directly; every method maps to one
//! server call and returns the decoded wire payload:
//!
//! ```rust,no_run
//! use mines_client::MinesClient;
//!
//! #[tokio::main]
//! async fn main() -> mines_client::Result<()> {
//!     let client = MinesClient::new("http://localhost:8000/")?.with_token("jwt");
//!
//!     let room = client.join_room("ABC123").await?;
//!     println!("Room by {}, {} min", room.owner, room.timeout_minutes);
//!
//!     let game_id = client.start_game(10.0, 3, "ABC123").await?;
//!     let response = client.click_box(&game_id, 0, "ABC123").await?;
//!     println!("State: {:?}, multiplier {}", response.game_state, response.multiplier);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod room;
mod round;
mod session;
mod storage;

pub use client::MinesClient;
pub use error::{Error, Result};
pub use room::{ExitDestination, RoomEvent, RoomSession, SessionTimings};
pub use round::{
    BOARD_CELLS, Board, CellStatus, GameState, MAX_MINES, MAX_MINES_MULTIPLIER, MoveOutcome,
    MoveTicket, RoundEnd, RoundReconciler, RoundStatus,
};
pub use session::{Countdown, SessionClock, SessionEvent};
pub use storage::DeviceStore;

// Re-export common types for convenience
pub use mines_common::{models::*, protocol::*};
