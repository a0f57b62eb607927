//! Transport session state machine.
//!
//! Maintains exactly one live push subscription per mounted room view and
//! turns raw push payloads into parsed [`Message`] deliveries. Uses the
//! action pattern: methods take time as input and return actions for the
//! driver to execute, so the state machine stays pure and testable.
//!
//! # State machine
//!
//! ```text
//! ┌──────────────┐  open()   ┌────────────┐  handshake   ┌───────────┐
//! │ Disconnected │──────────>│ Connecting │─────────────>│ Connected │
//! └──────────────┘           └────────────┘              └───────────┘
//!                                  │                        │      ^
//!                                  │ failure        failure │      │ handshake
//!                                  ↓                        ↓      │
//!                             ┌────────┐               ┌──────────────┐
//!                             │ Closed │<──── close()──│ Reconnecting │
//!                             └────────┘               └──────────────┘
//! ```
//!
//! `close()` reaches `Closed` from every state and is terminal: no automatic
//! reconnects occur afterwards, and late push payloads are dropped.
//!
//! Messages broadcast while disconnected are never retroactively delivered
//! through this channel; they are only recoverable via the history loader.

use std::{ops::Sub, time::Duration};

use roomcast_core::{Message, RoomId};

/// Initial reconnect delay after a transport failure.
pub const DEFAULT_INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the reconnect delay.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Connection state, owned exclusively by the session.
///
/// Read by the UI layer for status display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none requested.
    Disconnected,
    /// Subscription requested, handshake not yet complete.
    Connecting,
    /// Live subscription established.
    Connected,
    /// Transport failed; a retry is scheduled with backoff.
    Reconnecting,
    /// Torn down. Terminal.
    Closed,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay before the first reconnect attempt.
    pub initial_retry_delay: Duration,
    /// Cap applied to the doubling reconnect delay.
    pub max_retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay: DEFAULT_INITIAL_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

/// Actions returned by the session for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Establish the underlying connection and subscribe to the room topic.
    Subscribe {
        /// Room whose topic to subscribe to.
        room_id: RoomId,
    },

    /// Tear down the subscription for this room.
    Unsubscribe {
        /// Room whose topic to leave.
        room_id: RoomId,
    },

    /// Deliver a parsed push message to the reducer.
    Deliver(Message),
}

/// Push-feed session for a single room view.
///
/// Generic over `Instant` so reconnect timing works with both real time and
/// virtual time in tests.
#[derive(Debug, Clone)]
pub struct Session<I = std::time::Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    state: ConnectionState,
    config: SessionConfig,
    /// Room currently subscribed (or being subscribed).
    room: Option<RoomId>,
    /// Delay the next transport failure would schedule.
    retry_delay: Duration,
    /// Scheduled reconnect: (failure instant, delay to wait). `None` when no
    /// retry is pending or an attempt is already in flight.
    pending_retry: Option<(I, Duration)>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a session in [`ConnectionState::Disconnected`].
    pub fn new(config: SessionConfig) -> Self {
        let retry_delay = config.initial_retry_delay;
        Self {
            state: ConnectionState::Disconnected,
            config,
            room: None,
            retry_delay,
            pending_retry: None,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Room this session is bound to. `None` before the first `open`.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Delay that the next transport failure would schedule.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Open the subscription for a room.
    ///
    /// Idempotent: opening the already-open room is a no-op. Opening a
    /// different room first closes the prior subscription. A closed session
    /// never reopens.
    pub fn open(&mut self, room_id: RoomId) -> Vec<SessionAction> {
        if self.state == ConnectionState::Closed {
            tracing::warn!(room = %room_id, "open ignored: session is closed");
            return vec![];
        }

        let mut actions = Vec::new();
        if let Some(current) = &self.room {
            if *current == room_id && self.state != ConnectionState::Disconnected {
                return vec![];
            }
            if self.state != ConnectionState::Disconnected {
                actions.push(SessionAction::Unsubscribe { room_id: current.clone() });
            }
        }

        self.room = Some(room_id.clone());
        self.state = ConnectionState::Connecting;
        self.retry_delay = self.config.initial_retry_delay;
        self.pending_retry = None;
        actions.push(SessionAction::Subscribe { room_id });
        actions
    }

    /// Record a completed handshake.
    ///
    /// Resets the reconnect backoff. Ignored unless a subscription attempt
    /// is actually in progress.
    pub fn handshake_complete(&mut self) {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                self.state = ConnectionState::Connected;
                self.retry_delay = self.config.initial_retry_delay;
                self.pending_retry = None;
            },
            state => {
                tracing::debug!(?state, "handshake ignored in current state");
            },
        }
    }

    /// Record a transport-level failure and schedule a retry with backoff.
    ///
    /// The delay doubles per consecutive failure up to the configured cap.
    pub fn transport_failure(&mut self, reason: &str, now: I) {
        match self.state {
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Reconnecting => {
                tracing::warn!(
                    reason,
                    delay = ?self.retry_delay,
                    "transport failure, scheduling reconnect"
                );
                self.state = ConnectionState::Reconnecting;
                self.pending_retry = Some((now, self.retry_delay));
                self.retry_delay = (self.retry_delay * 2).min(self.config.max_retry_delay);
            },
            state => {
                tracing::debug!(?state, reason, "transport failure ignored in current state");
            },
        }
    }

    /// Process a raw push payload.
    ///
    /// Payloads parse to [`Message`] JSON. A malformed payload is logged and
    /// dropped; one bad event must not tear down the stream. Payloads
    /// arriving outside `Connected` (including after `close`) are dropped.
    pub fn handle_push(&mut self, payload: &str) -> Vec<SessionAction> {
        if self.state != ConnectionState::Connected {
            tracing::debug!(state = ?self.state, "push payload dropped outside connected state");
            return vec![];
        }

        match serde_json::from_str::<Message>(payload) {
            Ok(message) => vec![SessionAction::Deliver(message)],
            Err(err) => {
                tracing::warn!(%err, "malformed push payload dropped");
                vec![]
            },
        }
    }

    /// Process periodic maintenance: fire a due reconnect attempt.
    pub fn tick(&mut self, now: I) -> Vec<SessionAction> {
        if self.state != ConnectionState::Reconnecting {
            return vec![];
        }
        let Some((failed_at, delay)) = self.pending_retry else {
            // Attempt already in flight, waiting on the handshake.
            return vec![];
        };
        if now - failed_at < delay {
            return vec![];
        }

        self.pending_retry = None;
        self.room
            .clone()
            .map(|room_id| vec![SessionAction::Subscribe { room_id }])
            .unwrap_or_default()
    }

    /// Tear down the subscription. Safe to call repeatedly; terminal.
    pub fn close(&mut self) -> Vec<SessionAction> {
        if self.state == ConnectionState::Closed {
            return vec![];
        }

        let was_live = !matches!(self.state, ConnectionState::Disconnected);
        self.state = ConnectionState::Closed;
        self.pending_retry = None;

        match (&self.room, was_live) {
            (Some(room_id), true) => {
                vec![SessionAction::Unsubscribe { room_id: room_id.clone() }]
            },
            _ => vec![],
        }
    }
}

impl<I> Default for Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
