//! Room view side-effects and intents.
//!
//! Instructions produced by the [`RoomView`](crate::RoomView) state machine
//! for the runtime to execute.

use roomcast_client::{FetchRequest, OutgoingMessage};
use roomcast_core::RoomId;

use crate::ScrollTarget;

/// Actions produced by the room view state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Render the view.
    Render,

    /// Open the push-feed session for the room.
    OpenSession {
        /// Room to subscribe to.
        room_id: RoomId,
    },

    /// Close the push-feed session.
    CloseSession,

    /// Execute a history page fetch; resolution comes back as
    /// [`AppEvent::PageResolved`](crate::AppEvent::PageResolved).
    FetchPage(FetchRequest),

    /// Submit an outgoing message (fire-and-forget).
    Send(OutgoingMessage),

    /// Apply a scroll correction after the next render.
    ScrollTo(ScrollTarget),

    /// Authorization failed; the surrounding app must navigate away from
    /// this room.
    Redirect,
}
