//! The local per-turn countdown.
//!
//! [`TurnClock`] is a plain state machine with no time source of its own:
//! the client's transport loop feeds it one [`tick`](TurnClock::tick) per
//! real-time second and one [`observe`](TurnClock::observe) per snapshot.
//! Keeping it pure makes every transition unit-testable without a runtime.
//!
//! The clock is keyed on the snapshot pair `(started, turn)`. Whenever that
//! pair changes identity the previous countdown is torn down and a fresh one
//! armed at [`TURN_SECONDS`]; while the identity is unchanged the countdown
//! keeps running untouched. Because every snapshot re-derives the armed
//! state, a missed or duplicated event costs at most one full
//! [`TURN_SECONDS`] window before the clock self-corrects.

use crate::protocol::Seat;

/// Fixed turn duration in seconds. Not configurable per room.
pub const TURN_SECONDS: u32 = 25;

/// State of the local turn countdown.
///
/// There is exactly one clock per client and it lives for the whole match;
/// a countdown instance, however, has no identity across turn changes —
/// each `(started, turn)` identity gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnClock {
    /// No active started turn; ticks are ignored.
    #[default]
    Disarmed,
    /// Counting down `seat`'s turn.
    Armed {
        /// The seat this countdown belongs to.
        seat: Seat,
        /// Seconds left before automatic forfeiture.
        remaining: u32,
    },
}

/// Result of feeding a snapshot's `(started, turn)` pair to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rearm {
    /// Identity unchanged; the running countdown continues.
    Unchanged,
    /// The previous countdown (if any) was torn down and a fresh one armed
    /// for `seat` at [`TURN_SECONDS`].
    Armed(Seat),
    /// The previous countdown was torn down and nothing is armed.
    Disarmed,
}

/// Result of one one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Clock is disarmed; nothing happened.
    Idle,
    /// Countdown decremented; `remaining` seconds left for `seat`.
    Counting { seat: Seat, remaining: u32 },
    /// `seat`'s countdown hit zero. The caller must submit the automatic
    /// empty word; the clock has already restarted itself at
    /// [`TURN_SECONDS`] for the same seat.
    Expired { seat: Seat },
}

impl TurnClock {
    /// Reconcile the clock with a snapshot's `(started, turn)` pair.
    ///
    /// Arms only for `(Some(seat), true)`. A started room without a turn is
    /// treated as no active turn (tolerated, disarms). Rearming is a
    /// teardown-then-setup pair, so no two countdowns ever coexist.
    pub fn observe(&mut self, started: bool, turn: Option<Seat>) -> Rearm {
        let target = if started { turn } else { None };
        match (*self, target) {
            (TurnClock::Armed { seat, .. }, Some(next)) if seat == next => Rearm::Unchanged,
            (TurnClock::Disarmed, None) => Rearm::Unchanged,
            (_, Some(next)) => {
                *self = TurnClock::Armed {
                    seat: next,
                    remaining: TURN_SECONDS,
                };
                Rearm::Armed(next)
            }
            (_, None) => {
                *self = TurnClock::Disarmed;
                Rearm::Disarmed
            }
        }
    }

    /// Advance the countdown by one second.
    ///
    /// On expiry the clock does not wait for the server to acknowledge the
    /// forfeiture: it restarts at [`TURN_SECONDS`] for the same seat
    /// immediately, and the next authoritative `update` corrects the seat
    /// if the server has already advanced the turn.
    pub fn tick(&mut self) -> Tick {
        match self {
            TurnClock::Disarmed => Tick::Idle,
            TurnClock::Armed { seat, remaining } => {
                if *remaining <= 1 {
                    let seat = *seat;
                    *remaining = TURN_SECONDS;
                    Tick::Expired { seat }
                } else {
                    *remaining -= 1;
                    Tick::Counting {
                        seat: *seat,
                        remaining: *remaining,
                    }
                }
            }
        }
    }

    /// Cancel the countdown unconditionally (terminal `game_ended` path).
    pub fn disarm(&mut self) {
        *self = TurnClock::Disarmed;
    }

    /// The seat the clock is currently counting for, if armed.
    pub fn armed_seat(&self) -> Option<Seat> {
        match self {
            TurnClock::Disarmed => None,
            TurnClock::Armed { seat, .. } => Some(*seat),
        }
    }

    /// Seconds left in the current countdown, if armed.
    pub fn remaining(&self) -> Option<u32> {
        match self {
            TurnClock::Disarmed => None,
            TurnClock::Armed { remaining, .. } => Some(*remaining),
        }
    }
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
    fn starts_disarmed() {
        let clock = TurnClock::default();
        assert_eq!(clock, TurnClock::Disarmed);
        assert!(clock.armed_seat().is_none());
        assert!(clock.remaining().is_none());
    }

    #[test]
    fn arms_on_started_turn() {
        let mut clock = TurnClock::default();
        let rearm = clock.observe(true, Some(Seat::Player1));
        assert_eq!(rearm, Rearm::Armed(Seat::Player1));
        assert_eq!(clock.armed_seat(), Some(Seat::Player1));
        assert_eq!(clock.remaining(), Some(TURN_SECONDS));
    }

    #[test]
    fn does_not_arm_before_start() {
        let mut clock = TurnClock::default();
        assert_eq!(clock.observe(false, Some(Seat::Player1)), Rearm::Unchanged);
        assert_eq!(clock, TurnClock::Disarmed);
    }

    #[test]
    fn tolerates_started_room_without_turn() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player1));
        // A started snapshot with no turn disarms rather than panicking.
        assert_eq!(clock.observe(true, None), Rearm::Disarmed);
        assert_eq!(clock, TurnClock::Disarmed);
    }

    #[test]
    fn same_identity_does_not_rearm() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player1));
        clock.tick();
        clock.tick();
        assert_eq!(clock.remaining(), Some(TURN_SECONDS - 2));

        // The same snapshot pair again must not reset the countdown.
        assert_eq!(clock.observe(true, Some(Seat::Player1)), Rearm::Unchanged);
        assert_eq!(clock.remaining(), Some(TURN_SECONDS - 2));
    }

    #[test]
    fn turn_change_rearms_fresh() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player1));
        for _ in 0..10 {
            clock.tick();
        }

        let rearm = clock.observe(true, Some(Seat::Player2));
        assert_eq!(rearm, Rearm::Armed(Seat::Player2));
        assert_eq!(clock.armed_seat(), Some(Seat::Player2));
        assert_eq!(clock.remaining(), Some(TURN_SECONDS));
    }

    #[test]
    fn stop_disarms_mid_countdown() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player2));
        clock.tick();
        assert_eq!(clock.observe(false, Some(Seat::Player2)), Rearm::Disarmed);
        assert_eq!(clock.tick(), Tick::Idle);
    }

    #[test]
    fn ticks_down_then_expires_once_per_window() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player1));

        // 24 decrements: 24, 23, …, 1.
        for expected in (1..TURN_SECONDS).rev() {
            assert_eq!(
                clock.tick(),
                Tick::Counting {
                    seat: Seat::Player1,
                    remaining: expected
                }
            );
        }

        // The 25th tick expires and the clock restarts itself.
        assert_eq!(
            clock.tick(),
            Tick::Expired {
                seat: Seat::Player1
            }
        );
        assert_eq!(clock.remaining(), Some(TURN_SECONDS));
        assert_eq!(clock.armed_seat(), Some(Seat::Player1));

        // Still counting for the same (possibly stale) seat afterwards.
        assert_eq!(
            clock.tick(),
            Tick::Counting {
                seat: Seat::Player1,
                remaining: TURN_SECONDS - 1
            }
        );
    }

    #[test]
    fn expires_again_if_server_stays_silent() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player2));

        let mut expiries = 0;
        for _ in 0..(TURN_SECONDS * 3) {
            if matches!(clock.tick(), Tick::Expired { .. }) {
                expiries += 1;
            }
        }
        assert_eq!(expiries, 3);
    }

    #[test]
    fn disarm_cancels_pending_expiry() {
        let mut clock = TurnClock::default();
        clock.observe(true, Some(Seat::Player1));
        for _ in 0..(TURN_SECONDS - 1) {
            clock.tick();
        }
        assert_eq!(clock.remaining(), Some(1));

        clock.disarm();
        assert_eq!(clock.tick(), Tick::Idle);
        assert!(clock.remaining().is_none());
    }
}
