use mines_client::{
    CellStatus, DeviceStore, GameState, MinesClient, RoomEvent, RoomSession, SessionEvent,
};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> mines_client::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut store = DeviceStore::open("mines-store.json")?;

    // Log in and persist the bearer token like the mobile app does
    let client = MinesClient::new("http://localhost:8000/")?;
    let login = client.login("alice", "hunter2").await?;
    store.set_token(&login.token)?;
    store.set_display_name(&login.username)?;
    let client = client.with_token(login.token);

    // Join a room; the session countdown starts from the server timestamp
    let session = RoomSession::join(client, store, "ABC123").await?;
    let mut event_receiver = session.subscribe_to_events().await;

    // Spawn background task to print events as they arrive
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                RoomEvent::RoundStarted { game_id } => {
                    println!("🎮 Round started: {}", game_id);
                }
                RoomEvent::BoardUpdated => {
                    println!("📋 Board updated");
                }
                RoomEvent::RoundEnded { is_win, credited } => {
                    if is_win {
                        println!("🎉 You won! Credited {:.2}", credited);
                    } else {
                        println!("💣 Round lost!");
                    }
                }
                RoomEvent::CashedOut { amount } => {
                    println!("💰 Cashed out {:.2}", amount);
                }
                RoomEvent::BalanceDepleted => {
                    println!("🪙 Out of coins!");
                }
                RoomEvent::Session(SessionEvent::Tick { remaining }) => {
                    println!("⏱ {}", remaining);
                }
                RoomEvent::Session(SessionEvent::OneMinuteWarning) => {
                    println!("⚠️ One minute left!");
                }
                RoomEvent::Session(SessionEvent::TenSecondWarning) => {
                    println!("⚠️ Ten seconds left!");
                }
                RoomEvent::Session(SessionEvent::Expired) => {
                    println!("⏰ Room expired!");
                }
                RoomEvent::ForcedExit { destination } => {
                    println!("🚪 Leaving for {:?}", destination);
                    break;
                }
            }
        }
    });

    println!("Balance: {:.2}", session.balance().await);
    println!("Time left: {}", session.remaining_time().await);

    // Bet 10 coins on a board with 3 mines
    session.start_round(10.0, 3).await?;

    // Reveal a few cells
    for index in [0, 6, 12] {
        println!("\nRevealing cell {}...", index);
        let state = session.reveal(index).await?;
        display_board(&state);

        if state.status.is_terminal() {
            println!("Round over (status {:?})", state.status);
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    // Lock in the current multiplier if the round is still running
    if let Some(amount) = session.cash_out().await? {
        println!("\nCashed out for {:.2}", amount);
    }
    println!("Balance: {:.2}", session.balance().await);

    session.leave().await;
    println!("\nLeft the room");

    event_handler.abort();
    let _ = event_handler.await;

    Ok(())
}

fn display_board(state: &GameState) {
    println!("Board (multiplier {:.2}):", state.multiplier);
    for row in state.board.cells().chunks(5) {
        print!("  ");
        for cell in row {
            let symbol = match cell {
                CellStatus::Empty => "·",
                CellStatus::Clicked | CellStatus::Safe => "💎",
                CellStatus::Mine => "💣",
            };
            print!("{:2}", symbol);
        }
        println!();
    }
}
