//! Room view input events.
//!
//! Events originate from three sources: the UI (mount, scroll, composer
//! edits, unmount), the transport session (connection changes, delivered
//! pushes), and resolved history fetches.

use roomcast_client::{ConnectionState, FetchError};
use roomcast_core::{Message, MessagePage};

use crate::ViewportMetrics;

/// Events processed by the [`RoomView`](crate::RoomView) state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Room view mounted: open the session and fetch the initial page.
    Mounted,

    /// Session connection state changed (status display only).
    ConnectionChanged(ConnectionState),

    /// Live push delivered by the session.
    MessageReceived(Message),

    /// In-flight history fetch resolved.
    PageResolved {
        /// The fetched page, or the failure to surface.
        result: Result<MessagePage, FetchError>,
    },

    /// UI reported fresh viewport metrics after a scroll or render.
    Scrolled {
        /// Current layout measurements.
        metrics: ViewportMetrics,
    },

    /// Composer draft text changed.
    DraftEdited {
        /// Full replacement draft text.
        text: String,
    },

    /// Per-message assist flag toggled.
    AssistToggled,

    /// User asked to send the current draft.
    SubmitRequested,

    /// A previously-submitted send failed.
    SendFailed {
        /// Failure description for the status line.
        reason: String,
    },

    /// Room view unmounted: tear everything down.
    Unmounted,
}
