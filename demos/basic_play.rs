//! # Basic Play Example
//!
//! Demonstrates a complete Shiritori client lifecycle:
//!
//! 1. Connect to the game server via WebSocket
//! 2. Claim a seat with a display name
//! 3. React to room events (snapshots, the turn countdown, game end)
//! 4. Submit words typed on stdin; `/start`, `/end` and `/reset` drive the match
//! 5. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Against the default server:
//! cargo run --example basic_play
//!
//! # Pick a seat and name, or point at another server:
//! SHIRITORI_SEAT=player2 SHIRITORI_NAME=Bob \
//!     SHIRITORI_URL=ws://localhost:4000/ws cargo run --example basic_play
//! ```

use shiritori_client::{
    Seat, ShiritoriClient, ShiritoriConfig, ShiritoriEvent, WebSocketTransport,
    DEFAULT_SERVER_URL,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("SHIRITORI_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let seat = match std::env::var("SHIRITORI_SEAT").as_deref() {
        Ok("player2") => Seat::Player2,
        _ => Seat::Player1,
    };
    let name = std::env::var("SHIRITORI_NAME").unwrap_or_else(|_| "RustPlayer".to_string());
    tracing::info!("Connecting to {url} as {seat} ({name})");

    // ── Connect ─────────────────────────────────────────────────────
    let transport = WebSocketTransport::connect(&url).await?;

    // Start the client. This spawns a background task that drives the
    // transport and emits events on `event_rx`.
    let (mut client, mut event_rx) = ShiritoriClient::start(transport, ShiritoriConfig::new());

    // ── Join ────────────────────────────────────────────────────────
    // The one round-trip call: suspends until the server acknowledges.
    match client.join(seat, &name).await {
        Ok(ack) => tracing::info!("Joined room {:?}", ack.room_id),
        Err(e) => {
            tracing::error!("Join failed: {e}");
            client.shutdown().await;
            return Ok(());
        }
    }
    println!("Type a word to submit it. Commands: /start /end /reset");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            // Branch 1: incoming event from the client.
            event = event_rx.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    ShiritoriEvent::RoomUpdated { room } => {
                        for s in Seat::ALL {
                            let who = room.names.get(s).map(String::as_str).unwrap_or(s.as_str());
                            let score = room.scores.get(s).copied().unwrap_or(0);
                            let here = room.players.get(s).copied().unwrap_or(false);
                            println!("  {who}: {score} point(s) {}", if here { "" } else { "(waiting)" });
                        }
                        if let Some(turn) = room.active_turn() {
                            let marker = if Some(turn) == client.seat().await { " — your move!" } else { "" };
                            println!("  turn: {turn}{marker}");
                        }
                        if let Some(last) = room.word_history.last() {
                            println!("  last word: {last}");
                        }
                    }

                    ShiritoriEvent::ClockTick { remaining, .. } => {
                        // Only nag when it gets tight.
                        if remaining <= 5 {
                            println!("  ⏳ {remaining}s left!");
                        }
                    }

                    ShiritoriEvent::TurnTimedOut { seat } => {
                        println!("  {seat} ran out of time");
                    }

                    ShiritoriEvent::GameEnded { room, winner } => {
                        let who = room.names.get(winner).map(String::as_str).unwrap_or(winner.as_str());
                        println!("🏁 Game over — {who} wins! (/reset for a rematch)");
                    }

                    ShiritoriEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("unknown"));
                        break;
                    }

                    other => {
                        tracing::debug!("Event: {other:?}");
                    }
                }
            }

            // Branch 2: a line typed on stdin.
            line = stdin.next_line() => {
                let Ok(Some(line)) = line else { break };
                let result = match line.trim() {
                    "/start" => client.start_game().await,
                    "/end" => client.end_game().await,
                    "/reset" => client.reset_game().await,
                    word => client.submit_word(word).await,
                };
                if let Err(e) = result {
                    tracing::error!("{e}");
                }
            }

            // Branch 3: Ctrl+C — shut down gracefully.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down. Goodbye!");
    Ok(())
}
