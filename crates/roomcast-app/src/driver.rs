//! Driver trait for abstracting I/O and presentation.
//!
//! The [`Driver`] trait decouples the [`Runtime`](crate::Runtime) from the
//! concrete transport and UI layer. The same orchestration logic then runs
//! against real WebSocket/HTTP backends and against scripted test doubles.

use std::{future::Future, ops::Sub, time::Duration};

use roomcast_client::{FetchRequest, OutgoingMessage};
use roomcast_core::RoomId;

use crate::{AppEvent, RoomView, ScrollTarget};

/// Outcome of polling the push feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushPoll {
    /// A raw payload is ready for the session.
    Payload(String),
    /// Nothing ready right now; the feed is healthy.
    Idle,
    /// The feed has closed or failed; the session schedules a reconnect.
    Closed,
}

/// Abstracts I/O operations for the room-view runtime.
///
/// Implementations provide the transport and rendering surface while the
/// generic [`Runtime`](crate::Runtime) handles orchestration.
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in tests.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next event: UI input (mount, scroll, composer edits,
    /// unmount) and the resolutions of operations started via
    /// [`start_fetch`](Driver::start_fetch) / [`start_send`](Driver::start_send).
    ///
    /// Returns the next event, or `None` if no event is ready. Must not
    /// wait indefinitely for input while background operations are pending.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Establish the push-feed subscription for a room.
    ///
    /// Resolving `Ok` means the subscription handshake completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    fn subscribe(
        &mut self,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Tear down the push-feed subscription for a room.
    fn unsubscribe(&mut self, room_id: &RoomId) -> impl Future<Output = ()> + Send;

    /// Poll the live subscription for a raw push payload.
    ///
    /// Must not wait for a broadcast: a healthy-but-quiet feed answers
    /// [`PushPoll::Idle`] so the event loop keeps servicing UI events.
    /// [`PushPoll::Closed`] means the transport failed or closed and the
    /// runtime reports it to the session as a transport failure.
    fn poll_push(&mut self) -> impl Future<Output = PushPoll> + Send;

    /// Start a history page fetch.
    ///
    /// Fire-and-forget: the driver resolves the fetch in the background and
    /// delivers the outcome as [`AppEvent::PageResolved`](crate::AppEvent::PageResolved)
    /// through [`poll_event`](Driver::poll_event). The loop stays
    /// interactive while the fetch is pending; only the loader's
    /// single-flight guard is engaged.
    fn start_fetch(&mut self, request: FetchRequest) -> impl Future<Output = ()> + Send;

    /// Start an outgoing message submission.
    ///
    /// Fire-and-forget: delivery is observed via the push feed, and a
    /// failure comes back as [`AppEvent::SendFailed`](crate::AppEvent::SendFailed)
    /// through [`poll_event`](Driver::poll_event).
    fn start_send(&mut self, outgoing: OutgoingMessage) -> impl Future<Output = ()> + Send;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the room view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &RoomView) -> Result<(), Self::Error>;

    /// Apply a scroll correction after the most recent render.
    fn scroll_to(&mut self, target: ScrollTarget);

    /// Navigate away from the room after an authorization failure.
    fn redirect(&mut self);

    /// Stop the transport and clean up resources.
    fn stop(&mut self);
}
