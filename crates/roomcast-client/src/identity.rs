//! Local identity store.
//!
//! The persisted `email` / `clientChatId` pair is owned by the
//! authentication collaborator; this core reads it exactly once at room-view
//! mount and never mutates it.

use roomcast_core::ClientIdentity;

/// The persisted identity pair, as stored by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIdentity {
    /// Account email, used for credentialed endpoints.
    pub email: String,
    /// Per-browser-session chat identity.
    pub client_chat_id: ClientIdentity,
}

/// Read-once access to the persisted identity.
pub trait IdentityStore {
    /// Load the stored identity. `None` when no session is established.
    fn load(&self) -> Option<StoredIdentity>;
}

/// In-memory identity store for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    identity: Option<StoredIdentity>,
}

impl MemoryIdentityStore {
    /// Create a store holding the given identity.
    pub fn with_identity(email: impl Into<String>, client_chat_id: ClientIdentity) -> Self {
        Self { identity: Some(StoredIdentity { email: email.into(), client_chat_id }) }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<StoredIdentity> {
        self.identity.clone()
    }
}
