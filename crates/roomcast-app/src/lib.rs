//! Application layer for Roomcast
//!
//! Pure state machines and generic runtime for one mounted room view: the
//! message list, scroll coordination, composition, and the orchestration
//! loop tying them to the push-feed session.
//!
//! # Components
//!
//! - [`RoomView`]: room view state machine (stream, viewport, composer,
//!   backfill)
//! - [`Viewport`]: scroll/viewport coordinator (pure arithmetic)
//! - [`Composer`]: draft text and per-message assist flag
//! - [`Driver`]: trait for platform-specific I/O abstraction
//! - [`Runtime`]: generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod composer;
mod driver;
mod event;
mod runtime;
mod view;
mod viewport;

pub use action::AppAction;
pub use composer::{Composer, Draft};
pub use driver::{Driver, PushPoll};
pub use event::AppEvent;
pub use runtime::Runtime;
pub use view::RoomView;
pub use viewport::{NEAR_BOTTOM_THRESHOLD, ScrollTarget, Viewport, ViewportMetrics};
