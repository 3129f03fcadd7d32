#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Protocol serialization tests for the Shiritori client.
//!
//! Verifies the JSON envelopes against literal fixtures matching real
//! server traffic: snake_case event tags, camelCase payload fields, and
//! tolerant snapshot parsing (absent fields, null turn, partial seat maps).

use serde_json::json;
use shiritori_client::protocol::{ClientIntent, JoinAck, RoomSnapshot, Seat, ServerEvent};

// ════════════════════════════════════════════════════════════════════
// Outbound intents — exact wire shapes
// ════════════════════════════════════════════════════════════════════

#[test]
fn join_game_intent_wire_shape() {
    let intent = ClientIntent::JoinGame {
        player: Seat::Player1,
        name: "Alice".into(),
    };
    let value = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(
        value,
        json!({
            "type": "join_game",
            "data": { "player": "player1", "name": "Alice" }
        })
    );
}

#[test]
fn submit_word_intent_wire_shape() {
    let intent = ClientIntent::SubmitWord {
        room_id: "R1".into(),
        player: Seat::Player2,
        word: "tomato".into(),
    };
    let value = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(
        value,
        json!({
            "type": "submit_word",
            "data": { "roomId": "R1", "player": "player2", "word": "tomato" }
        })
    );
}

#[test]
fn timeout_submission_is_an_empty_word() {
    // The automatic forfeiture is indistinguishable on the wire from an
    // explicit empty submission.
    let intent = ClientIntent::SubmitWord {
        room_id: "R1".into(),
        player: Seat::Player1,
        word: String::new(),
    };
    let value = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(value["data"]["word"], json!(""));
}

#[test]
fn room_trigger_intents_wire_shape() {
    let cases = [
        (
            ClientIntent::StartGame {
                room_id: "R1".into(),
            },
            "start_game",
        ),
        (
            ClientIntent::EndGame {
                room_id: "R1".into(),
            },
            "end_game",
        ),
        (
            ClientIntent::ResetGame {
                room_id: "R1".into(),
            },
            "reset_game",
        ),
    ];
    for (intent, tag) in cases {
        let value = serde_json::to_value(&intent).expect("serialize");
        assert_eq!(value, json!({ "type": tag, "data": { "roomId": "R1" } }));
    }
}

// ════════════════════════════════════════════════════════════════════
// Inbound events — fixtures as the server sends them
// ════════════════════════════════════════════════════════════════════

#[test]
fn update_envelope_parses_full_snapshot() {
    let raw = r#"{
        "type": "update",
        "data": {
            "players": { "player1": true, "player2": true },
            "names": { "player1": "Alice", "player2": "Bob" },
            "scores": { "player1": 3, "player2": -2 },
            "started": true,
            "turn": "player2",
            "wordHistory": ["apple", "elephant", "tiger"]
        }
    }"#;

    let event: ServerEvent = serde_json::from_str(raw).expect("parse update");
    let ServerEvent::Update(room) = event else {
        panic!("expected Update, got {event:?}");
    };

    assert_eq!(room.players.get(Seat::Player1), Some(&true));
    assert_eq!(room.names.get(Seat::Player2).map(String::as_str), Some("Bob"));
    // Penalties can take a score below zero.
    assert_eq!(room.scores.get(Seat::Player2), Some(&-2));
    assert!(room.started);
    assert_eq!(room.turn, Some(Seat::Player2));
    assert_eq!(room.word_history, vec!["apple", "elephant", "tiger"]);
    assert_eq!(room.active_turn(), Some(Seat::Player2));
}

#[test]
fn update_envelope_tolerates_missing_fields() {
    // A freshly created room: the server sends nothing but the seat flags.
    let raw = r#"{
        "type": "update",
        "data": { "players": { "player1": true } }
    }"#;

    let event: ServerEvent = serde_json::from_str(raw).expect("parse update");
    let ServerEvent::Update(room) = event else {
        panic!("expected Update, got {event:?}");
    };

    assert_eq!(room.players.get(Seat::Player1), Some(&true));
    assert!(room.players.get(Seat::Player2).is_none());
    assert!(room.names.get(Seat::Player1).is_none());
    assert!(!room.started);
    assert!(room.turn.is_none());
    assert!(room.word_history.is_empty());
}

#[test]
fn update_envelope_accepts_null_turn() {
    let raw = r#"{
        "type": "update",
        "data": { "started": true, "turn": null }
    }"#;

    let event: ServerEvent = serde_json::from_str(raw).expect("parse update");
    let ServerEvent::Update(room) = event else {
        panic!("expected Update, got {event:?}");
    };

    assert!(room.started);
    // Defensive: started with no turn means no countdown, not an error.
    assert_eq!(room.active_turn(), None);
}

#[test]
fn game_ended_envelope_parses() {
    let raw = r#"{
        "type": "game_ended",
        "data": {
            "room": {
                "players": { "player1": true, "player2": true },
                "scores": { "player1": 5, "player2": 1 },
                "started": false,
                "wordHistory": ["apple"]
            },
            "winner": "player1"
        }
    }"#;

    let event: ServerEvent = serde_json::from_str(raw).expect("parse game_ended");
    let ServerEvent::GameEnded { room, winner } = event else {
        panic!("expected GameEnded, got {event:?}");
    };

    assert_eq!(winner, Seat::Player1);
    assert!(!room.started);
    assert_eq!(room.scores.get(Seat::Player1), Some(&5));
}

#[test]
fn join_ack_envelope_parses_both_outcomes() {
    let ok: ServerEvent = serde_json::from_str(
        r#"{ "type": "join_ack", "data": { "ok": true, "roomId": "R1" } }"#,
    )
    .expect("parse ok ack");
    assert_eq!(
        ok,
        ServerEvent::JoinAck(JoinAck {
            ok: true,
            room_id: Some("R1".into()),
            message: None,
        })
    );

    let rejected: ServerEvent = serde_json::from_str(
        r#"{ "type": "join_ack", "data": { "ok": false, "message": "Room full" } }"#,
    )
    .expect("parse rejected ack");
    assert_eq!(
        rejected,
        ServerEvent::JoinAck(JoinAck {
            ok: false,
            room_id: None,
            message: Some("Room full".into()),
        })
    );
}

#[test]
fn unknown_event_type_is_a_parse_error() {
    // The transport loop skips these with a warning rather than dying.
    let result = serde_json::from_str::<ServerEvent>(r#"{ "type": "chat", "data": {} }"#);
    assert!(result.is_err());
}

#[test]
fn unknown_seat_is_a_parse_error() {
    let result = serde_json::from_str::<Seat>("\"player3\"");
    assert!(result.is_err());
}

#[test]
fn snapshot_survives_a_round_trip() {
    let raw = r#"{
        "players": { "player1": true, "player2": true },
        "names": { "player1": "Alice", "player2": "Bob" },
        "scores": { "player1": -1, "player2": 4 },
        "started": true,
        "turn": "player1",
        "wordHistory": ["ringo", "orange"]
    }"#;
    let room: RoomSnapshot = serde_json::from_str(raw).expect("parse snapshot");
    let json = serde_json::to_string(&room).expect("serialize snapshot");
    let again: RoomSnapshot = serde_json::from_str(&json).expect("reparse snapshot");
    assert_eq!(room, again);

    // camelCase field name on the way out, too.
    assert!(json.contains("wordHistory"));
}
