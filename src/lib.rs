//! # Shiritori Client
//!
//! Transport-agnostic Rust client for the Shiritori realtime word-chain
//! game protocol.
//!
//! This crate is the client-side half of a two-player word-chain match: it
//! mirrors the server's authoritative room snapshot, runs the local
//! per-turn countdown, and turns user actions into outbound intents. Word
//! legality, chain rules, and scoring all live on the server — the client
//! only renders what the server decides.
//!
//! ## Features
//!
//! - **Transport-agnostic** — implement the [`Transport`] trait for any backend
//! - **Wire-compatible** — protocol types match the game server's JSON exactly
//! - **WebSocket built-in** — default `transport-websocket` feature provides `WebSocketTransport`
//! - **Event-driven** — receive typed [`ShiritoriEvent`]s via a channel
//! - **Self-correcting countdown** — the turn clock is re-derived from every
//!   snapshot, so missed or duplicated events cost at most one turn window
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shiritori_client::{
//!     Seat, ShiritoriClient, ShiritoriConfig, ShiritoriEvent, WebSocketTransport,
//!     DEFAULT_SERVER_URL,
//! };
//!
//! let transport = WebSocketTransport::connect(DEFAULT_SERVER_URL).await?;
//! let (client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
//!
//! client.join(Seat::Player1, "Alice").await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ShiritoriEvent::RoomUpdated { room } => { /* redraw */ }
//!         ShiritoriEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod client;
pub mod clock;
pub mod error;
pub mod event;
pub mod protocol;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use client::{ShiritoriClient, ShiritoriConfig, DEFAULT_SERVER_URL};
pub use clock::{TurnClock, TURN_SECONDS};
pub use error::ShiritoriError;
pub use event::ShiritoriEvent;
pub use protocol::{ClientIntent, JoinAck, RoomSnapshot, Seat, ServerEvent};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
