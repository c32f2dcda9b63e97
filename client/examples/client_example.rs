use mines_client::{MinesClient, RoundState};

#[tokio::main]
async fn main() -> mines_client::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a client connecting to the server
    let client = MinesClient::new("http://localhost:8000/")?;

    // Log in to obtain a bearer token
    let login = client.login("alice", "hunter2").await?;
    println!("Logged in as {}", login.username);
    let client = client.with_token(login.token);

    // Join a room by its 6-character code
    let room = client.join_room("ABC123").await?;
    println!(
        "Joined room by {} (created {}, {} min timeout, {} starting coins)",
        room.owner, room.created_at, room.timeout_minutes, room.coins
    );

    // Start a round: bet 10 coins, 3 mines on the 5x5 board
    let game_id = client.start_game(10.0, 3, "ABC123").await?;
    println!("Started round with ID: {}", game_id);

    // Reveal a cell and print the authoritative snapshot
    let response = client.click_box(&game_id, 0, "ABC123").await?;
    println!(
        "Revealed positions: {:?}, multiplier {:.2}",
        response.revealed, response.multiplier
    );

    match response.game_state {
        RoundState::InProgress => {
            // Lock in the current multiplier
            let amount = client.cashout(&game_id, "ABC123").await?;
            println!("Cashed out {:.2}", amount);
        }
        RoundState::Won => println!("Round won!"),
        RoundState::Lost => println!("Hit a mine at one of {:?}", response.mines),
    }

    // Print the room leaderboard, best cashout first
    let leaderboard = client.leaderboard("ABC123").await?;
    for (rank, entry) in leaderboard.iter().enumerate() {
        println!("#{} {} - {:.2}", rank + 1, entry.game_id, entry.cashout_amount);
    }

    Ok(())
}
