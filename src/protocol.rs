//! Wire-compatible protocol types for the Shiritori room protocol.
//!
//! Every type in this module produces the exact JSON the authoritative game
//! server emits and consumes. Messages travel as one envelope per event,
//! adjacently tagged as `{"type": <event>, "data": <payload>}`, with
//! snake_case event names (`join_game`, `submit_word`, `update`, …) and
//! camelCase payload fields (`roomId`, `wordHistory`).
//!
//! The server owns every field of [`RoomSnapshot`]; the client mirrors it
//! read-only and replaces it wholesale on each `update`.

use serde::{Deserialize, Serialize};

// ── Seats ───────────────────────────────────────────────────────────

/// One of the two fixed player slots in a room.
///
/// Serializes as `"player1"` / `"player2"`, matching the seat keys the
/// server uses throughout the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    /// Both seats, in board order.
    pub const ALL: [Seat; 2] = [Seat::Player1, Seat::Player2];

    /// The opposing seat.
    pub fn other(self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }

    /// The wire name of this seat (`"player1"` / `"player2"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Seat::Player1 => "player1",
            Seat::Player2 => "player2",
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Per-seat maps ───────────────────────────────────────────────────

/// A mapping from seat to `T` in which either seat may be absent.
///
/// The server serializes these as plain objects keyed by seat name
/// (`{"player1": …, "player2": …}`) and freely omits seats that have no
/// value yet, so both slots are optional here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatMap<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<T>,
}

impl<T> SeatMap<T> {
    /// The value for `seat`, if the server has sent one.
    pub fn get(&self, seat: Seat) -> Option<&T> {
        match seat {
            Seat::Player1 => self.player1.as_ref(),
            Seat::Player2 => self.player2.as_ref(),
        }
    }

    /// Set the value for `seat`, returning the previous value.
    pub fn insert(&mut self, seat: Seat, value: T) -> Option<T> {
        match seat {
            Seat::Player1 => self.player1.replace(value),
            Seat::Player2 => self.player2.replace(value),
        }
    }
}

// Manual impl so `T` is not required to be `Default`.
impl<T> Default for SeatMap<T> {
    fn default() -> Self {
        Self {
            player1: None,
            player2: None,
        }
    }
}

// ── Room snapshot ───────────────────────────────────────────────────

/// The complete, server-authoritative description of a room.
///
/// Received in full on every `update`; any field the server omits is
/// absent, never carried over from a previous snapshot. `turn` is only
/// meaningful while `started` is true, but a started room without a turn
/// must be tolerated (the countdown simply stays disarmed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSnapshot {
    /// Which seats are occupied.
    pub players: SeatMap<bool>,
    /// Display names by seat.
    pub names: SeatMap<String>,
    /// Scores by seat. Invalid-word penalties can push these negative.
    pub scores: SeatMap<i32>,
    /// Whether the match is in progress.
    pub started: bool,
    /// The seat whose move is awaited, when a turn is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<Seat>,
    /// Accepted words so far, oldest first.
    pub word_history: Vec<String>,
}

impl RoomSnapshot {
    /// The seat whose turn is currently running, or `None` when the match
    /// has not started or no turn is active.
    pub fn active_turn(&self) -> Option<Seat> {
        if self.started {
            self.turn
        } else {
            None
        }
    }

    /// Whether both seats are occupied.
    pub fn is_full(&self) -> bool {
        Seat::ALL
            .iter()
            .all(|&seat| self.players.get(seat).copied().unwrap_or(false))
    }
}

// ── Join acknowledgement ────────────────────────────────────────────

/// Server reply to a `join_game` request.
///
/// On success `room_id` carries the opaque handle the client must attach
/// to every later intent; on failure `message` explains the rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAck {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Intents sent from client to server.
///
/// All intents except [`JoinGame`](ClientIntent::JoinGame) are
/// fire-and-forget: the server never replies directly, it only broadcasts
/// a fresh `update` once the intent takes effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Claim a seat. The only request/ack intent; answered by `join_ack`.
    JoinGame { player: Seat, name: String },
    /// Submit a word for `player`'s turn. An empty `word` is the automatic
    /// timeout forfeiture; the judge treats it as invalid and moves on.
    #[serde(rename_all = "camelCase")]
    SubmitWord {
        room_id: String,
        player: Seat,
        word: String,
    },
    /// Begin the match.
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: String },
    /// Finish the match and have the server declare a winner.
    #[serde(rename_all = "camelCase")]
    EndGame { room_id: String },
    /// Clear scores and history for a rematch.
    #[serde(rename_all = "camelCase")]
    ResetGame { room_id: String },
}

/// Events pushed from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full room snapshot. Replaces all derived state, last-write-wins.
    Update(RoomSnapshot),
    /// Terminal signal: the match is over and `winner` took it.
    GameEnded { room: RoomSnapshot, winner: Seat },
    /// Reply to an outstanding `join_game` request.
    JoinAck(JoinAck),
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn seat_wire_names() {
        assert_eq!(serde_json::to_string(&Seat::Player1).unwrap(), "\"player1\"");
        assert_eq!(serde_json::to_string(&Seat::Player2).unwrap(), "\"player2\"");
        let seat: Seat = serde_json::from_str("\"player2\"").unwrap();
        assert_eq!(seat, Seat::Player2);
    }

    #[test]
    fn seat_other_flips() {
        assert_eq!(Seat::Player1.other(), Seat::Player2);
        assert_eq!(Seat::Player2.other(), Seat::Player1);
    }

    #[test]
    fn seat_map_get_and_insert() {
        let mut map = SeatMap::default();
        assert!(map.get(Seat::Player1).is_none());
        assert!(map.insert(Seat::Player1, 3).is_none());
        assert_eq!(map.insert(Seat::Player1, 5), Some(3));
        assert_eq!(map.get(Seat::Player1), Some(&5));
        assert!(map.get(Seat::Player2).is_none());
    }

    #[test]
    fn snapshot_active_turn_requires_started() {
        let mut room = RoomSnapshot {
            turn: Some(Seat::Player1),
            ..RoomSnapshot::default()
        };
        assert_eq!(room.active_turn(), None);

        room.started = true;
        assert_eq!(room.active_turn(), Some(Seat::Player1));

        room.turn = None;
        assert_eq!(room.active_turn(), None);
    }

    #[test]
    fn snapshot_is_full_needs_both_seats() {
        let mut room = RoomSnapshot::default();
        assert!(!room.is_full());
        room.players.insert(Seat::Player1, true);
        assert!(!room.is_full());
        room.players.insert(Seat::Player2, true);
        assert!(room.is_full());
    }
}
