//! Outgoing message send contract.
//!
//! The send is fire-and-forget: the message list is never updated from the
//! send response, only from the push feed echo. Failures surface to the
//! user; the typed text is not restored.

use async_trait::async_trait;
use roomcast_core::{ClientIdentity, RoomId};
use serde::Serialize;
use thiserror::Error;

/// Wire body for the send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// Target room.
    pub room_id: RoomId,
    /// Message content.
    pub text: String,
    /// Whether an AI-style assist was requested for this message.
    pub assist_requested: bool,
    /// Local session identity, so the echoed broadcast can be recognized.
    pub client_chat_id: ClientIdentity,
}

/// Send failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Endpoint rejected the message.
    #[error("send rejected with status {status}")]
    Rejected {
        /// HTTP-equivalent status code.
        status: u16,
    },

    /// Request never produced a response.
    #[error("send failed: {reason}")]
    Network {
        /// Underlying failure description.
        reason: String,
    },
}

/// Endpoint for submitting outgoing messages, credentialed against the
/// caller's session.
#[async_trait]
pub trait SendBackend: Send + Sync {
    /// Submit an outgoing message. Delivery is observed via the push feed,
    /// not this response.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Rejected`] for non-2xx responses and
    /// [`SendError::Network`] when no response was produced.
    async fn send(&self, outgoing: &OutgoingMessage) -> Result<(), SendError>;
}
