#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for Shiritori client integration tests.
//!
//! Provides two fake transports plus helpers for building server-side JSON:
//!
//! - [`MockTransport`] replays a scripted list of inbound messages. Good for
//!   flows that do not depend on outbound/inbound ordering.
//! - [`LoopbackTransport`] / [`LoopbackServer`] form an in-process duplex
//!   pair, letting a test act as the server: read what the client sent,
//!   then answer. Required for join flows, where the ack must not arrive
//!   before the request.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use shiritori_client::protocol::{ClientIntent, JoinAck, RoomSnapshot, Seat, SeatMap, ServerEvent};
use shiritori_client::{ShiritoriError, Transport};

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted mock transport for integration testing.
///
/// Scripted server responses are consumed in order by `recv()`.
/// All messages sent by the client are recorded in `sent`.
pub struct MockTransport {
    /// Scripted server responses (consumed in order by `recv`).
    incoming: VecDeque<Option<Result<String, ShiritoriError>>>,
    /// Recorded outgoing messages from the client.
    pub sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a new mock transport with the given scripted incoming messages.
    ///
    /// Returns the transport plus shared handles for inspecting sent
    /// messages and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, ShiritoriError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), ShiritoriError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, ShiritoriError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // No more scripted messages — hang forever so the transport loop
            // stays alive until shutdown is called.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), ShiritoriError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Loopback pair ───────────────────────────────────────────────────

/// Client half of an in-process duplex channel pair.
pub struct LoopbackTransport {
    /// Messages the client sends go here (server reads the other end).
    tx: mpsc::UnboundedSender<String>,
    /// Messages the server sends arrive here.
    rx: mpsc::UnboundedReceiver<String>,
}

/// Server half of the loopback — the test drives the conversation with it.
pub struct LoopbackServer {
    /// Read what the client sent.
    pub rx: mpsc::UnboundedReceiver<String>,
    /// Send messages to the client (as if they came from a server).
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, server)` pair.
pub fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
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

impl LoopbackServer {
    /// Wait for the next outbound message and parse it as a [`ClientIntent`].
    pub async fn expect_intent(&mut self) -> ClientIntent {
        let raw = self.rx.recv().await.expect("client closed its send half");
        serde_json::from_str(&raw).expect("client sent invalid intent JSON")
    }

    /// The next outbound intent, if one has already arrived.
    pub fn try_intent(&mut self) -> Option<ClientIntent> {
        let raw = self.rx.try_recv().ok()?;
        Some(serde_json::from_str(&raw).expect("client sent invalid intent JSON"))
    }

    /// Push a server event to the client.
    pub fn send_event(&self, json: String) {
        self.tx.send(json).expect("client receive half closed");
    }
}

// ── Room fixtures ───────────────────────────────────────────────────

/// A room with both seats taken, before the match starts.
pub fn lobby_room() -> RoomSnapshot {
    RoomSnapshot {
        players: SeatMap {
            player1: Some(true),
            player2: Some(true),
        },
        names: SeatMap {
            player1: Some("Alice".into()),
            player2: Some("Bob".into()),
        },
        scores: SeatMap {
            player1: Some(0),
            player2: Some(0),
        },
        ..RoomSnapshot::default()
    }
}

/// A started room awaiting `turn`'s move.
pub fn in_progress_room(turn: Seat) -> RoomSnapshot {
    RoomSnapshot {
        started: true,
        turn: Some(turn),
        word_history: vec!["apple".into(), "elephant".into()],
        ..lobby_room()
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// Returns the JSON envelope for an `update` server event.
pub fn update_json(room: &RoomSnapshot) -> String {
    serde_json::to_string(&ServerEvent::Update(room.clone())).expect("update_json serialization")
}

/// Returns the JSON envelope for a `game_ended` server event.
pub fn game_ended_json(room: &RoomSnapshot, winner: Seat) -> String {
    serde_json::to_string(&ServerEvent::GameEnded {
        room: room.clone(),
        winner,
    })
    .expect("game_ended_json serialization")
}

/// Returns the JSON envelope for a successful `join_ack`.
pub fn join_ack_ok_json(room_id: &str) -> String {
    serde_json::to_string(&ServerEvent::JoinAck(JoinAck {
        ok: true,
        room_id: Some(room_id.into()),
        message: None,
    }))
    .expect("join_ack_ok_json serialization")
}

/// Returns the JSON envelope for a rejected `join_ack`.
pub fn join_ack_rejected_json(message: &str) -> String {
    serde_json::to_string(&ServerEvent::JoinAck(JoinAck {
        ok: false,
        room_id: None,
        message: Some(message.into()),
    }))
    .expect("join_ack_rejected_json serialization")
}
