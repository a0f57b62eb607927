//! Client
//!
//! Sans-IO state machines for the room message stream's network edge: the
//! [`Session`] push-feed lifecycle and the [`HistoryLoader`] page fetch
//! bookkeeping, plus the caller-executed send contract.
//!
//! # Architecture
//!
//! State machines here hold no sockets and spawn no tasks. They consume
//! events and time, and return actions for the caller to execute. This keeps
//! reconnect, dedup, and single-flight logic fully testable without a
//! network.
//!
//! # Components
//!
//! - [`Session`]: connection lifecycle per mounted room view (subscribe,
//!   reconnect with backoff, push parsing, terminal close)
//! - [`HistoryLoader`]: single-flight page fetch guard and page bookkeeping
//! - [`HistoryBackend`] / [`SendBackend`]: traits the surrounding app
//!   implements against its HTTP endpoints
//! - [`IdentityStore`]: read-once access to the persisted session identity
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::PushFeed`]: WebSocket push feed with channel delivery
//! - [`transport::HttpBackend`]: reqwest-backed history/send endpoints

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod history;
mod identity;
mod send;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use history::{DEFAULT_PAGE_SIZE, FetchError, FetchRequest, HistoryBackend, HistoryLoader};
pub use identity::{IdentityStore, MemoryIdentityStore, StoredIdentity};
pub use roomcast_core::{ClientIdentity, Message, MessagePage, RoomId};
pub use send::{OutgoingMessage, SendBackend, SendError};
pub use session::{
    ConnectionState, DEFAULT_INITIAL_RETRY_DELAY, DEFAULT_MAX_RETRY_DELAY, Session, SessionAction,
    SessionConfig,
};
