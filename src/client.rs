//! Async client for the Shiritori room protocol.
//!
//! [`ShiritoriClient`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. Events are emitted on
//! a bounded channel ([`tokio::sync::mpsc::Receiver<ShiritoriEvent>`])
//! returned from [`ShiritoriClient::start`].
//!
//! The transport loop is the single execution context of the client: it
//! interleaves inbound server events, outbound intents, and the one-second
//! turn-clock tick through one `tokio::select!`, each handler running to
//! completion before the next. The [`TurnClock`] lives inside the loop and
//! is reconciled against every snapshot, so the countdown self-corrects on
//! each `update` no matter what the transport dropped or duplicated.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = connect_somehow().await;
//! let (client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
//!
//! let ack = client.join(Seat::Player1, "Alice").await?;
//! tracing::info!("joined room {:?}", ack.room_id);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ShiritoriEvent::RoomUpdated { room } => { /* redraw */ }
//!         ShiritoriEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};

use crate::clock::{Rearm, Tick, TurnClock, TURN_SECONDS};
use crate::error::{Result, ShiritoriError};
use crate::event::ShiritoriEvent;
use crate::protocol::{ClientIntent, JoinAck, RoomSnapshot, Seat, ServerEvent};
use crate::transport::Transport;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Cadence of the turn-clock tick.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Default production game server endpoint.
pub const DEFAULT_SERVER_URL: &str = "wss://word-game-server-br59.onrender.com/ws";

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`ShiritoriClient`] connection.
///
/// All fields have sensible defaults; tune them with the builder setters.
///
/// # Example
///
/// ```
/// use shiritori_client::client::ShiritoriConfig;
/// use std::time::Duration;
///
/// let config = ShiritoriConfig::new()
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct ShiritoriConfig {
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up with incoming server events, events
    /// are dropped (with a warning logged) to avoid blocking the transport
    /// loop. The `Disconnected` event is always delivered regardless of
    /// capacity.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// When [`ShiritoriClient::shutdown`] is called, the background
    /// transport loop is given this much time to close the transport and
    /// emit a final `Disconnected` event. If the timeout expires the task
    /// is aborted.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the transport loop
    /// immediately without waiting for graceful shutdown.
    pub shutdown_timeout: Duration,
}

impl ShiritoriConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the transport loop
    /// immediately without waiting for graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for ShiritoriConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Internal plumbing ───────────────────────────────────────────────

/// Commands queued from the handle to the transport loop.
enum Command {
    /// Seat claim awaiting a `join_ack` reply.
    Join {
        seat: Seat,
        name: String,
        reply: oneshot::Sender<JoinAck>,
    },
    /// Fire-and-forget intent, sent as-is.
    Intent(ClientIntent),
}

/// A join request the loop has sent but the server has not yet answered.
struct PendingJoin {
    seat: Seat,
    reply: oneshot::Sender<JoinAck>,
}

/// Internal shared state between the client handle and the transport loop.
///
/// Everything here is a read-only mirror for the handle's accessors; the
/// transport loop is the sole writer, except for the optimistic winner
/// clear in [`ShiritoriClient::reset_game`] and the pending-word buffer.
struct ClientState {
    connected: AtomicBool,
    seat: Mutex<Option<Seat>>,
    room_id: Mutex<Option<String>>,
    winner: Mutex<Option<Seat>>,
    room: Mutex<RoomSnapshot>,
    remaining_seconds: Mutex<Option<u32>>,
    pending_word: Mutex<String>,
}

impl ClientState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            seat: Mutex::new(None),
            room_id: Mutex::new(None),
            winner: Mutex::new(None),
            room: Mutex::new(RoomSnapshot::default()),
            remaining_seconds: Mutex::new(None),
            pending_word: Mutex::new(String::new()),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for the Shiritori room protocol.
///
/// Created via [`ShiritoriClient::start`], which spawns a background
/// transport loop and returns this handle together with an event receiver.
///
/// Fire-and-forget methods serialize a [`ClientIntent`] and queue it to the
/// transport loop, returning once the message is queued. [`join`] is the
/// one exception: it suspends until the server's acknowledgement arrives.
///
/// [`join`]: ShiritoriClient::join
pub struct ShiritoriClient {
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<Command>,
    /// Shared state updated by the transport loop.
    state: Arc<ClientState>,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl ShiritoriClient {
    /// Start the client transport loop and return a handle plus event receiver.
    ///
    /// # Arguments
    ///
    /// * `transport` — A connected [`Transport`] implementation.
    /// * `config` — Client configuration.
    ///
    /// # Returns
    ///
    /// A tuple of `(client_handle, event_receiver)`. The event receiver
    /// yields [`ShiritoriEvent`]s until the transport closes or the client
    /// shuts down; dropping it unsubscribes.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: ShiritoriConfig,
    ) -> (Self, mpsc::Receiver<ShiritoriEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<ShiritoriEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ClientState::new());
        let loop_state = Arc::clone(&state);

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            loop_state,
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            state,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Claim `seat` with the given display name.
    ///
    /// The name is trimmed and validated locally before anything is sent:
    /// an empty result rejects immediately with
    /// [`ShiritoriError::EmptyDisplayName`]. Otherwise the call suspends
    /// until the server's acknowledgement arrives. On success the seat and
    /// room id are recorded and every other room operation unlocks; on
    /// rejection the server's message is returned verbatim in
    /// [`ShiritoriError::JoinRejected`] and nothing is recorded.
    ///
    /// There is no automatic retry; call again to re-attempt.
    ///
    /// # Errors
    ///
    /// [`EmptyDisplayName`](ShiritoriError::EmptyDisplayName),
    /// [`JoinRejected`](ShiritoriError::JoinRejected),
    /// [`NotConnected`](ShiritoriError::NotConnected), or
    /// [`TransportClosed`](ShiritoriError::TransportClosed) if the
    /// connection dies while the acknowledgement is pending.
    pub async fn join(&self, seat: Seat, display_name: &str) -> Result<JoinAck> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(ShiritoriError::EmptyDisplayName);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Join {
            seat,
            name: name.to_string(),
            reply: reply_tx,
        })?;

        let ack = reply_rx
            .await
            .map_err(|_| ShiritoriError::TransportClosed)?;
        if ack.ok {
            Ok(ack)
        } else {
            Err(ShiritoriError::JoinRejected {
                message: ack.message.unwrap_or_else(|| "join rejected".to_string()),
            })
        }
    }

    /// Submit a word for this client's seat.
    ///
    /// The word is trimmed first; an empty result is a local no-op and is
    /// never sent. Whether the word is actually legal is entirely the
    /// server's call — the client applies no chain or dictionary checks.
    ///
    /// # Errors
    ///
    /// Returns [`ShiritoriError::NotInRoom`] before a successful join, or
    /// [`ShiritoriError::NotConnected`] if the transport has closed.
    pub async fn submit_word(&self, word: &str) -> Result<()> {
        let word = word.trim();
        if word.is_empty() {
            // Only the turn clock submits empty words.
            return Ok(());
        }
        let (room_id, player) = self.session().await?;
        self.send(Command::Intent(ClientIntent::SubmitWord {
            room_id,
            player,
            word: word.to_string(),
        }))
    }

    /// Replace the in-progress word buffer.
    pub async fn set_pending_word(&self, text: impl Into<String>) {
        *self.state.pending_word.lock().await = text.into();
    }

    /// The current in-progress word buffer.
    pub async fn pending_word(&self) -> String {
        self.state.pending_word.lock().await.clone()
    }

    /// Submit the in-progress word buffer and clear it.
    ///
    /// A buffer that trims to empty is a local no-op, same as
    /// [`submit_word`](ShiritoriClient::submit_word); the buffer is only
    /// cleared once the submission is queued.
    ///
    /// # Errors
    ///
    /// Same as [`submit_word`](ShiritoriClient::submit_word).
    pub async fn submit_pending_word(&self) -> Result<()> {
        let word = self.state.pending_word.lock().await.clone();
        if word.trim().is_empty() {
            return Ok(());
        }
        self.submit_word(&word).await?;
        self.state.pending_word.lock().await.clear();
        Ok(())
    }

    /// Ask the server to begin the match.
    ///
    /// Whether both seats are occupied is not checked here; the server
    /// remains authoritative and may ignore the request.
    ///
    /// # Errors
    ///
    /// Returns [`ShiritoriError::NotInRoom`] before a successful join, or
    /// [`ShiritoriError::NotConnected`] if the transport has closed.
    pub async fn start_game(&self) -> Result<()> {
        let room_id = self.require_room().await?;
        self.send(Command::Intent(ClientIntent::StartGame { room_id }))
    }

    /// Ask the server to finish the match and declare a winner.
    ///
    /// # Errors
    ///
    /// Returns [`ShiritoriError::NotInRoom`] before a successful join, or
    /// [`ShiritoriError::NotConnected`] if the transport has closed.
    pub async fn end_game(&self) -> Result<()> {
        let room_id = self.require_room().await?;
        self.send(Command::Intent(ClientIntent::EndGame { room_id }))
    }

    /// Ask the server for a rematch.
    ///
    /// The local winner flag is cleared immediately, before the server
    /// confirms — the next authoritative `update` wins either way.
    ///
    /// # Errors
    ///
    /// Returns [`ShiritoriError::NotInRoom`] before a successful join, or
    /// [`ShiritoriError::NotConnected`] if the transport has closed.
    pub async fn reset_game(&self) -> Result<()> {
        let room_id = self.require_room().await?;
        *self.state.winner.lock().await = None;
        self.send(Command::Intent(ClientIntent::ResetGame { room_id }))
    }

    /// Shut down the client, closing the transport and stopping the background task.
    ///
    /// After calling this method, the event receiver will yield `None` once
    /// the transport loop exits.
    pub async fn shutdown(&mut self) {
        debug!("ShiritoriClient: shutdown requested");

        // Signal the transport loop to shut down gracefully.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout. If it doesn't exit in
        // time, abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// This client's seat, once a join has been acknowledged.
    pub async fn seat(&self) -> Option<Seat> {
        *self.state.seat.lock().await
    }

    /// The opaque room handle, once a join has been acknowledged.
    pub async fn room_id(&self) -> Option<String> {
        self.state.room_id.lock().await.clone()
    }

    /// The most recent authoritative room snapshot.
    pub async fn room(&self) -> RoomSnapshot {
        self.state.room.lock().await.clone()
    }

    /// The winning seat, if the server has declared one.
    pub async fn winner(&self) -> Option<Seat> {
        *self.state.winner.lock().await
    }

    /// Seconds left in the current countdown, or `None` when no turn is
    /// being timed.
    pub async fn remaining_seconds(&self) -> Option<u32> {
        *self.state.remaining_seconds.lock().await
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Queue a `Command` to the transport loop.
    fn send(&self, cmd: Command) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(ShiritoriError::NotConnected);
        }
        self.cmd_tx
            .send(cmd)
            .map_err(|_| ShiritoriError::NotConnected)
    }

    /// The joined room id, or [`ShiritoriError::NotInRoom`].
    async fn require_room(&self) -> Result<String> {
        self.state
            .room_id
            .lock()
            .await
            .clone()
            .ok_or(ShiritoriError::NotInRoom)
    }

    /// The joined `(room id, seat)` pair, or [`ShiritoriError::NotInRoom`].
    async fn session(&self) -> Result<(String, Seat)> {
        let room_id = self.require_room().await?;
        let seat = (*self.state.seat.lock().await).ok_or(ShiritoriError::NotInRoom)?;
        Ok((room_id, seat))
    }
}

impl std::fmt::Debug for ShiritoriClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShiritoriClient")
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for ShiritoriClient {
    fn drop(&mut self) {
        // `Drop` is synchronous so we cannot await a graceful shutdown.
        // The only safe action is to abort the spawned task, which causes
        // the transport loop future to be dropped immediately. The
        // `shutdown_tx` oneshot is intentionally *not* sent here: sending
        // it would trigger a graceful path that calls async
        // `transport.close()`, but there is no executor context to drive
        // it inside `Drop`.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background transport loop that multiplexes send/receive/tick via
/// `tokio::select!`.
///
/// Exits when:
/// - The command channel closes (client handle dropped or shutdown called)
/// - The transport returns `None` (server closed connection)
/// - A transport error occurs
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::Sender<ShiritoriEvent>,
    state: Arc<ClientState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    // Emit the synthetic Connected event before entering the select loop.
    emit_event(&event_tx, ShiritoriEvent::Connected).await;

    let mut clock = TurnClock::default();
    let mut pending_join: Option<PendingJoin> = None;

    // The tick source runs for the life of the loop; the clock decides
    // whether a given tick means anything. First tick is one full period
    // out, not immediate.
    let start = tokio::time::Instant::now() + TICK_PERIOD;
    let mut ticker = tokio::time::interval_at(start, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Branch 1: outgoing command from the client handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Command::Join { seat, name, reply }) => {
                        if pending_join.is_some() {
                            warn!("new join request supersedes a pending one");
                        }
                        let intent = ClientIntent::JoinGame { player: seat, name };
                        match send_intent(&mut transport, &intent).await {
                            Ok(()) => pending_join = Some(PendingJoin { seat, reply }),
                            Err(e) => {
                                error!("transport send error: {e}");
                                emit_disconnected(
                                    &event_tx,
                                    &state,
                                    Some(format!("transport send error: {e}")),
                                ).await;
                                break;
                            }
                        }
                    }
                    Some(Command::Intent(intent)) => {
                        if let Err(e) = send_intent(&mut transport, &intent).await {
                            error!("transport send error: {e}");
                            emit_disconnected(
                                &event_tx,
                                &state,
                                Some(format!("transport send error: {e}")),
                            ).await;
                            break;
                        }
                    }
                    // Command channel closed — client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                break;
            }

            // Branch 3: turn-clock tick
            _ = ticker.tick() => {
                match clock.tick() {
                    Tick::Idle => {}
                    Tick::Counting { seat, remaining } => {
                        *state.remaining_seconds.lock().await = Some(remaining);
                        emit_event(&event_tx, ShiritoriEvent::ClockTick { seat, remaining }).await;
                    }
                    Tick::Expired { seat } => {
                        // Timeout and explicit empty submission are the same
                        // wire message; the judge penalizes and advances.
                        *state.remaining_seconds.lock().await = Some(TURN_SECONDS);
                        let room_id = state.room_id.lock().await.clone();
                        match room_id {
                            Some(room_id) => {
                                debug!(%seat, "turn expired, submitting automatic empty word");
                                let intent = ClientIntent::SubmitWord {
                                    room_id,
                                    player: seat,
                                    word: String::new(),
                                };
                                if let Err(e) = send_intent(&mut transport, &intent).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &state,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            None => {
                                warn!(%seat, "turn expired with no joined room; dropping automatic submission");
                            }
                        }
                        emit_event(&event_tx, ShiritoriEvent::TurnTimedOut { seat }).await;
                    }
                }
            }

            // Branch 4: incoming message from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                handle_server_event(
                                    event,
                                    &mut clock,
                                    &mut ticker,
                                    &mut pending_join,
                                    &event_tx,
                                    &state,
                                ).await;
                            }
                            Err(e) => {
                                warn!("failed to deserialize server event: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &state,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by server");
                        emit_disconnected(&event_tx, &state, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Serialize and send one intent.
///
/// A serialization failure is a programming bug: it is logged and swallowed
/// so it cannot kill the loop. A transport failure is returned to the
/// caller, which shuts the loop down.
async fn send_intent(
    transport: &mut impl Transport,
    intent: &ClientIntent,
) -> std::result::Result<(), ShiritoriError> {
    debug!("sending client intent: {:?}", std::mem::discriminant(intent));
    match serde_json::to_string(intent) {
        Ok(json) => transport.send(json).await,
        Err(e) => {
            error!("failed to serialize ClientIntent: {e}");
            Ok(())
        }
    }
}

/// Apply one inbound [`ServerEvent`] to the clock, the shared mirrors, and
/// the event channel.
async fn handle_server_event(
    event: ServerEvent,
    clock: &mut TurnClock,
    ticker: &mut tokio::time::Interval,
    pending_join: &mut Option<PendingJoin>,
    event_tx: &mpsc::Sender<ShiritoriEvent>,
    state: &ClientState,
) {
    match event {
        ServerEvent::Update(room) => {
            // Reconcile the clock before publishing: the snapshot's
            // (started, turn) pair is the sole arm/disarm trigger.
            match clock.observe(room.started, room.turn) {
                Rearm::Armed(seat) => {
                    // Fresh countdown, fresh tick phase: the old timer
                    // instance is gone before the new one starts.
                    ticker.reset();
                    *state.remaining_seconds.lock().await = Some(TURN_SECONDS);
                    debug!(%seat, "turn clock armed");
                }
                Rearm::Disarmed => {
                    *state.remaining_seconds.lock().await = None;
                    debug!("turn clock disarmed");
                }
                Rearm::Unchanged => {}
            }
            // Wholesale replacement; nothing from the previous snapshot
            // survives.
            *state.room.lock().await = room.clone();
            emit_event(event_tx, ShiritoriEvent::RoomUpdated { room }).await;
        }
        ServerEvent::GameEnded { room, winner } => {
            // Terminal signal overrides any in-flight countdown.
            clock.disarm();
            *state.remaining_seconds.lock().await = None;
            *state.room.lock().await = room.clone();
            *state.winner.lock().await = Some(winner);
            debug!(%winner, "game ended");
            emit_event(event_tx, ShiritoriEvent::GameEnded { room, winner }).await;
        }
        ServerEvent::JoinAck(ack) => match pending_join.take() {
            Some(PendingJoin { seat, reply }) => {
                if ack.ok {
                    *state.seat.lock().await = Some(seat);
                    match &ack.room_id {
                        Some(id) => *state.room_id.lock().await = Some(id.clone()),
                        None => warn!("join ack ok without a roomId"),
                    }
                    debug!(%seat, room_id = ?ack.room_id, "join acknowledged");
                }
                // The caller may have stopped waiting.
                let _ = reply.send(ack);
            }
            None => warn!("join ack with no pending join request; dropping"),
        },
    }
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the transport loop.
async fn emit_event(event_tx: &mpsc::Sender<ShiritoriEvent>, event: ShiritoriEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit a [`Disconnected`](ShiritoriEvent::Disconnected) event and update state.
///
/// Uses `send().await` (blocking) instead of `try_send` because
/// `Disconnected` is always the last event on the channel and must never be
/// silently dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<ShiritoriEvent>,
    state: &ClientState,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    let event = ShiritoriEvent::Disconnected { reason };
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
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
    use crate::protocol::SeatMap;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that records sent messages and replays scripted responses.
    struct MockTransport {
        /// Messages that `recv()` will yield in order.
        incoming: VecDeque<Option<std::result::Result<String, ShiritoriError>>>,
        /// Recorded outgoing messages.
        sent: Arc<StdMutex<Vec<String>>>,
        /// Whether `close()` was called.
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, ShiritoriError>>>,
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
        async fn send(&mut self, message: String) -> std::result::Result<(), ShiritoriError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, ShiritoriError>> {
            if let Some(item) = self.incoming.pop_front() {
                // An explicit `None` entry signals a clean transport close;
                // `Some(result)` delivers the scripted message or error.
                item
            } else {
                // All scripted messages have been delivered — hang forever
                // so the transport loop stays alive until shutdown.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), ShiritoriError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn lobby_room() -> RoomSnapshot {
        RoomSnapshot {
            players: SeatMap {
                player1: Some(true),
                player2: None,
            },
            names: SeatMap {
                player1: Some("Alice".into()),
                player2: None,
            },
            ..RoomSnapshot::default()
        }
    }

    fn update_json(room: &RoomSnapshot) -> String {
        serde_json::to_string(&ServerEvent::Update(room.clone())).unwrap()
    }

    fn game_ended_json(room: &RoomSnapshot, winner: Seat) -> String {
        serde_json::to_string(&ServerEvent::GameEnded {
            room: room.clone(),
            winner,
        })
        .unwrap()
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn connected_is_first_event() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let first = events.recv().await.unwrap();
        assert!(
            matches!(first, ShiritoriEvent::Connected),
            "expected Connected as first event, got {first:?}"
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn update_replaces_snapshot_mirror() {
        let room = lobby_room();
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Ok(update_json(&room)))]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ShiritoriEvent::RoomUpdated { .. }));

        assert_eq!(client.room().await, room);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn game_ended_sets_winner_mirror() {
        let room = lobby_room();
        let (transport, _sent, _closed) =
            MockTransport::new(vec![Some(Ok(game_ended_json(&room, Seat::Player2)))]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        if let ShiritoriEvent::GameEnded { winner, .. } = event {
            assert_eq!(winner, Seat::Player2);
        } else {
            panic!("expected GameEnded, got {event:?}");
        }

        assert_eq!(client.winner().await, Some(Seat::Player2));
        assert!(client.remaining_seconds().await.is_none());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn unparseable_message_does_not_kill_loop() {
        let room = lobby_room();
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok("{not json".into())),
            Some(Ok(r#"{"type":"mystery","data":{}}"#.into())),
            Some(Ok(update_json(&room))),
        ]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let _ = events.recv().await; // Connected
        // Both bad messages are skipped; the valid update still lands.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ShiritoriEvent::RoomUpdated { .. }));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn empty_word_is_local_noop() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        // No room joined, but an empty submission short-circuits first.
        client.submit_word("   ").await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sent.lock().unwrap().is_empty());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn room_ops_require_a_join() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        assert!(matches!(
            client.submit_word("apple").await,
            Err(ShiritoriError::NotInRoom)
        ));
        assert!(matches!(
            client.start_game().await,
            Err(ShiritoriError::NotInRoom)
        ));
        assert!(matches!(
            client.end_game().await,
            Err(ShiritoriError::NotInRoom)
        ));
        assert!(matches!(
            client.reset_game().await,
            Err(ShiritoriError::NotInRoom)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn join_with_blank_name_never_sends() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        let result = client.join(Seat::Player1, "   ").await;
        assert!(matches!(result, Err(ShiritoriError::EmptyDisplayName)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sent.lock().unwrap().is_empty());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn pending_word_buffer_round_trip() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        client.set_pending_word("ringo").await;
        assert_eq!(client.pending_word().await, "ringo");

        // A whitespace-only buffer is a no-op and stays put.
        client.set_pending_word("  ").await;
        client.submit_pending_word().await.unwrap();
        assert_eq!(client.pending_word().await, "  ");

        client.shutdown().await;
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = ShiritoriConfig::new();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn config_builder_methods() {
        let config = ShiritoriConfig::new()
            .with_event_channel_capacity(512)
            .with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(config.event_channel_capacity, 512);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn event_channel_capacity_is_clamped_to_one() {
        let config = ShiritoriConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn not_connected_error_after_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        client.shutdown().await;

        let result = client.submit_word("apple").await;
        assert!(matches!(result, Err(ShiritoriError::NotConnected)));
    }

    #[tokio::test]
    async fn shutdown_emits_disconnected_and_closes_transport() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        client.shutdown().await;

        let event = events.recv().await.unwrap();
        if let ShiritoriEvent::Disconnected { reason } = event {
            assert_eq!(reason.as_deref(), Some("client shut down"));
        } else {
            panic!("expected Disconnected, got {event:?}");
        }

        assert!(closed.load(Ordering::Relaxed));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn disconnected_on_transport_close() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            // Explicit None signals clean transport close.
            None,
        ]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        assert!(matches!(event, ShiritoriEvent::Disconnected { .. }));
        assert!(!client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn transport_recv_error_emits_disconnected() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Err(
            ShiritoriError::TransportReceive("boom".into()),
        ))]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());

        let _ = events.recv().await; // Connected
        let event = events.recv().await.unwrap();
        if let ShiritoriEvent::Disconnected { reason } = event {
            assert!(reason.unwrap().contains("boom"));
        } else {
            panic!("expected Disconnected, got {event:?}");
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn join_fails_fast_when_loop_is_gone() {
        let (transport, _sent, _closed) = MockTransport::new(vec![None]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Disconnected

        let result = client.join(Seat::Player1, "Alice").await;
        assert!(matches!(
            result,
            Err(ShiritoriError::NotConnected) | Err(ShiritoriError::TransportClosed)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn double_shutdown_does_not_panic() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        client.shutdown().await;
        client.shutdown().await; // should not panic
    }

    #[tokio::test]
    async fn drop_without_explicit_shutdown() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        // Drop the client without calling shutdown.
        drop(client);

        // The transport loop should eventually exit; the event channel
        // closes. We just verify we don't hang or panic.
        while let Some(_event) = events.recv().await {}
    }

    #[tokio::test]
    async fn event_channel_backpressure_does_not_block() {
        // More updates than the event channel can hold.
        let room = lobby_room();
        let mut incoming: Vec<Option<std::result::Result<String, ShiritoriError>>> = Vec::new();
        for _ in 0..20 {
            incoming.push(Some(Ok(update_json(&room))));
        }
        incoming.push(None);

        let (transport, _sent, _closed) = MockTransport::new(incoming);

        let config = ShiritoriConfig::new().with_event_channel_capacity(1);
        let (mut client, mut events) = ShiritoriClient::start(transport, config);

        // Let the channel fill up and events get dropped.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut count = 0;
        while let Some(_event) = events.recv().await {
            count += 1;
        }
        // Connected (first try_send) and Disconnected (blocking send) are
        // guaranteed; intermediate updates may be dropped.
        assert!(count >= 2, "expected at least 2 events, got {count}");
        assert!(
            count < 22,
            "expected backpressure to drop some events, but got all {count}"
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (transport, _sent, _closed) = MockTransport::new(vec![]);

        let (mut client, mut events) = ShiritoriClient::start(transport, ShiritoriConfig::new());
        let _ = events.recv().await; // Connected

        let debug_str = format!("{client:?}");
        assert!(debug_str.contains("ShiritoriClient"));
        assert!(debug_str.contains("connected"));

        client.shutdown().await;
    }
}
