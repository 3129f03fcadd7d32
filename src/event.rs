//! Typed events surfaced to the view layer.
//!
//! [`ShiritoriEvent`]s are delivered on the bounded channel returned by
//! [`ShiritoriClient::start`](crate::client::ShiritoriClient::start). The
//! receiver is the subscription: holding it keeps events flowing, dropping
//! it unsubscribes. A view can stay a pure projection of
//! `{snapshot, timer value, winner}` by redrawing on each event.

use crate::protocol::{RoomSnapshot, Seat};

/// Events emitted by the client's transport loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ShiritoriEvent {
    /// Synthetic first event: the transport loop is running.
    Connected,

    /// The server pushed a fresh room snapshot. All previously derived
    /// state has been replaced wholesale.
    RoomUpdated {
        /// The new authoritative snapshot.
        room: RoomSnapshot,
    },

    /// Terminal: the match ended and the countdown was cancelled.
    GameEnded {
        /// Final snapshot accompanying the result.
        room: RoomSnapshot,
        /// The winning seat.
        winner: Seat,
    },

    /// The local countdown advanced by one second.
    ClockTick {
        /// Seat whose turn is being timed.
        seat: Seat,
        /// Seconds left before automatic forfeiture.
        remaining: u32,
    },

    /// `seat` ran out of time; an automatic empty-word submission was sent
    /// and the countdown restarted at [`TURN_SECONDS`](crate::clock::TURN_SECONDS).
    TurnTimedOut {
        /// Seat that forfeited the turn.
        seat: Seat,
    },

    /// The connection is gone. Always the last event on the channel.
    Disconnected {
        /// Why, when known ("client shut down", transport error, …).
        reason: Option<String>,
    },
}
