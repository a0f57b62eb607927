//! Core data model for Roomcast.
//!
//! Defines the canonical chat types ([`Message`], [`MessagePage`], [`RoomId`],
//! [`ClientIdentity`]) and the [`MessageStream`] reducer: the single source of
//! truth for "what messages does this room currently show".
//!
//! This crate is pure data and logic. No I/O, no async runtime, no clocks.
//! Transport and fetch live in `roomcast-client`; viewport policy lives in
//! `roomcast-app`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod message;
mod stream;

pub use message::{ClientIdentity, Message, MessagePage, Origin, RoomId};
pub use stream::{AppendOutcome, MessageStream};
