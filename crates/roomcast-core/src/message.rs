//! Canonical chat types.
//!
//! Wire forms are camelCase JSON, matching the product's browser payloads.
//! Fields the server never transmits ([`Message::origin`],
//! [`Message::pending`]) are derived locally and skipped by serde.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Opaque room identifier.
///
/// Immutable for the lifetime of a chat session. The server may use numeric
/// ids internally; the client treats the value as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room identifier from its wire representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Wire representation of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-browser-session client identity.
///
/// Generated once per session and persisted by the identity store so a
/// client's own messages can be recognized independent of the account
/// identity. Stable for the duration of a connection; regenerated only on
/// explicit logout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Create an identity from its persisted representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identity from OS entropy.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut id = String::with_capacity(32);
        for byte in bytes {
            id.push_str(&format!("{byte:02x}"));
        }
        Self(id)
    }

    /// Persisted representation of the identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message origin relative to the local client.
///
/// Derived at insertion time by comparing the sender identity against the
/// stream's local identity. Never transmitted, never recomputed lazily, so
/// an identity change mid-session does not relabel history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Sent from this client session.
    Own,
    /// Sent from any other session.
    #[default]
    Other,
}

/// The canonical chat unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Session identity of the author (not the account identity).
    pub sender_client_id: ClientIdentity,

    /// Display name, resolved server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Avatar URL, resolved server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,

    /// Raw message content. Rendered, never executed.
    pub text: String,

    /// Server-assigned instant (epoch milliseconds).
    /// Authoritative for ordering; client send time is never used.
    pub timestamp: u64,

    /// Whether this message came from the local session. Derived, not wire.
    #[serde(skip)]
    pub origin: Origin,

    /// Optimistic local echo awaiting its server broadcast. Derived, not
    /// wire.
    #[serde(skip)]
    pub pending: bool,
}

impl Message {
    /// Create a message as it would arrive off the wire.
    pub fn new(sender: ClientIdentity, text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            sender_client_id: sender,
            author_name: None,
            author_avatar_url: None,
            text: text.into(),
            timestamp,
            origin: Origin::Other,
            pending: false,
        }
    }
}

/// A bounded, ordered batch of past messages.
///
/// Page 0 is the most recent page; within a page messages are ordered
/// oldest to newest so naive prepending preserves the global order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Page contents, oldest first.
    pub messages: Vec<Message>,

    /// Index of this page (0 = most recent).
    pub page_index: u32,

    /// Total number of pages the room currently has.
    pub total_pages: u32,
}
