//! # Scripted Server Example
//!
//! Shows how to implement the [`Transport`] trait with a simple in-process
//! loopback channel, then plays a whole two-turn match against a scripted
//! fake server. This is useful for:
//!
//! - **Testing** — exercise your UI logic without a real server
//! - **Custom backends** — adapt any I/O layer (TCP, QUIC, WebRTC data channels)
//!
//! ## Running
//!
//! ```sh
//! cargo run --example scripted_server
//! ```

use async_trait::async_trait;
use shiritori_client::protocol::{
    ClientIntent, JoinAck, RoomSnapshot, Seat, SeatMap, ServerEvent,
};
use shiritori_client::{
    ShiritoriClient, ShiritoriConfig, ShiritoriError, ShiritoriEvent, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: Define a channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// A loopback transport that shuttles messages through in-process channels.
///
/// The **client half** (`LoopbackTransport`) implements [`Transport`] and
/// is handed to `ShiritoriClient::start`; the **server half**
/// (`LoopbackServer`) lets this example inject events and read what the
/// client sent.
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// The "server side" of the loopback — use this to drive the conversation.
pub struct LoopbackServer {
    /// Read what the client sent.
    pub rx: mpsc::UnboundedReceiver<String>,
    /// Send messages to the client (as if they came from a server).
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, server)` pair.
fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();

    let transport = LoopbackTransport {
        tx: client_tx,
        rx: client_rx,
    };
    let server = LoopbackServer {
        rx: server_rx,
        tx: server_tx,
    };

    (transport, server)
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Implement the Transport trait
// ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), ShiritoriError> {
        self.tx
            .send(message)
            .map_err(|e| ShiritoriError::TransportSend(e.to_string()))
    }

    /// Cancel-safe because `mpsc::UnboundedReceiver::recv` is cancel-safe.
    async fn recv(&mut self) -> Option<Result<String, ShiritoriError>> {
        self.rx.recv().await.map(Ok)
    }

    /// Close is a no-op for channels — dropping is sufficient.
    async fn close(&mut self) -> Result<(), ShiritoriError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: A tiny scripted judge
// ─────────────────────────────────────────────────────────────────────

/// Run the fake server: acknowledge the join, start the match on request,
/// accept two submissions, then end the game.
async fn run_fake_server(mut server: LoopbackServer) {
    let mut room = RoomSnapshot {
        players: SeatMap {
            player1: Some(true),
            player2: Some(true),
        },
        names: SeatMap {
            player1: Some("Rustacean".into()),
            player2: Some("HouseBot".into()),
        },
        scores: SeatMap {
            player1: Some(0),
            player2: Some(0),
        },
        ..RoomSnapshot::default()
    };

    let send = |server: &LoopbackServer, event: &ServerEvent| {
        match serde_json::to_string(event) {
            Ok(json) => {
                let _ = server.tx.send(json);
            }
            Err(e) => tracing::error!("fake server: failed to serialize event: {e}"),
        }
    };

    while let Some(raw) = server.rx.recv().await {
        let Ok(intent) = serde_json::from_str::<ClientIntent>(&raw) else {
            tracing::warn!("fake server: unparseable intent {raw}");
            continue;
        };

        match intent {
            ClientIntent::JoinGame { player, name } => {
                tracing::info!("fake server: {player} joined as {name}");
                room.names.insert(player, name);
                send(
                    &server,
                    &ServerEvent::JoinAck(JoinAck {
                        ok: true,
                        room_id: Some("DEMO".into()),
                        message: None,
                    }),
                );
                send(&server, &ServerEvent::Update(room.clone()));
            }
            ClientIntent::StartGame { .. } => {
                room.started = true;
                room.turn = Some(Seat::Player1);
                send(&server, &ServerEvent::Update(room.clone()));
            }
            ClientIntent::SubmitWord { player, word, .. } => {
                tracing::info!("fake server: {player} submitted {word:?}");
                room.word_history.push(word);
                let score = room.scores.get(player).copied().unwrap_or(0);
                room.scores.insert(player, score + 1);

                if room.word_history.len() >= 2 {
                    // A short match is plenty for a demo.
                    room.started = false;
                    room.turn = None;
                    send(
                        &server,
                        &ServerEvent::GameEnded {
                            room: room.clone(),
                            winner: Seat::Player1,
                        },
                    );
                    break;
                }

                room.turn = Some(player.other());
                send(&server, &ServerEvent::Update(room.clone()));

                // The house bot answers instantly for the other seat.
                room.word_history.push("elephant".into());
                room.turn = Some(player);
                send(&server, &ServerEvent::Update(room.clone()));
            }
            other => {
                tracing::info!("fake server: ignoring {other:?}");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 4: Wire together the client and the fake server
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, server) = loopback_pair();
    let judge = tokio::spawn(run_fake_server(server));

    let (mut client, mut event_rx) = ShiritoriClient::start(transport, ShiritoriConfig::new());

    // Join and kick the match off.
    let ack = client.join(Seat::Player1, "Rustacean").await?;
    tracing::info!("Joined room {:?}", ack.room_id);
    client.start_game().await?;

    // Play: whenever it's our turn, answer with the next canned word.
    let mut words = ["apple", "tangerine"].into_iter();
    while let Some(event) = event_rx.recv().await {
        match event {
            ShiritoriEvent::RoomUpdated { room } => {
                tracing::info!("Room: history={:?} turn={:?}", room.word_history, room.turn);
                if room.active_turn() == client.seat().await {
                    if let Some(word) = words.next() {
                        client.submit_word(word).await?;
                    }
                }
            }
            ShiritoriEvent::GameEnded { winner, room } => {
                tracing::info!(
                    "Game over — {winner} wins with {:?} point(s)",
                    room.scores.get(winner)
                );
                break;
            }
            ShiritoriEvent::Disconnected { reason } => {
                tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("clean"));
                break;
            }
            other => {
                tracing::debug!("Event: {other:?}");
            }
        }
    }

    // ── Clean shutdown ──────────────────────────────────────────────
    client.shutdown().await;
    judge.abort();
    tracing::info!("Done — the scripted match completed.");
    Ok(())
}
