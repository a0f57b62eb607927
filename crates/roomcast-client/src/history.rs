//! History page loading.
//!
//! Splits the paginated history fetch into sans-IO bookkeeping
//! ([`HistoryLoader`]) and an async endpoint trait ([`HistoryBackend`]).
//! The loader enforces the single-flight contract: at most one fetch is in
//! flight per room view, and a second request while one is pending is
//! ignored rather than queued.

use async_trait::async_trait;
use roomcast_core::{MessagePage, RoomId};
use thiserror::Error;

/// Default number of messages per history page.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// History fetch failure, carrying the HTTP-equivalent status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Endpoint answered with a non-2xx status.
    #[error("history fetch rejected with status {status}")]
    Status {
        /// HTTP-equivalent status code.
        status: u16,
    },

    /// Request never produced a response.
    #[error("history fetch failed: {reason}")]
    Network {
        /// Underlying failure description.
        reason: String,
    },
}

impl FetchError {
    /// Whether this failure means "not authorized for this room".
    ///
    /// Authorization failures are never retried; the surrounding app
    /// redirects away from the room. Everything else is transient and
    /// retryable by user action (scroll again).
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403 })
    }
}

/// A fetch the caller should execute against the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Room whose history to fetch.
    pub room_id: RoomId,
    /// Page to fetch (0 = most recent).
    pub page_index: u32,
    /// Fixed page size for this room view.
    pub page_size: u32,
}

/// Fetch bookkeeping for one room view.
///
/// Owns the single-flight guard and the `total_pages` count learned from
/// resolved pages. The guard stays engaged until the in-flight fetch
/// resolves or errors; a hung fetch therefore blocks further backfill,
/// which is the documented trade-off for never double-prepending.
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    room_id: RoomId,
    page_size: u32,
    /// Page index currently being fetched.
    in_flight: Option<u32>,
    /// Total page count reported by the most recent resolved page.
    total_pages: Option<u32>,
}

impl HistoryLoader {
    /// Create a loader for a room with the given page size.
    pub fn new(room_id: RoomId, page_size: u32) -> Self {
        Self { room_id, page_size, in_flight: None, total_pages: None }
    }

    /// Room this loader fetches for.
    pub fn room(&self) -> &RoomId {
        &self.room_id
    }

    /// Fixed page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page index currently in flight, if any.
    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    /// Total pages reported by the server. `None` before the first page.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// Whether a page with this index remains to be fetched.
    ///
    /// Before the first page resolves the answer is `true`: the initial
    /// fetch must always go out.
    pub fn has_more(&self, page_index: u32) -> bool {
        self.total_pages.is_none_or(|total| page_index < total)
    }

    /// Begin a fetch for a page, unless one is already in flight.
    pub fn request(&mut self, page_index: u32) -> Option<FetchRequest> {
        if let Some(pending) = self.in_flight {
            tracing::debug!(pending, requested = page_index, "fetch suppressed: already in flight");
            return None;
        }

        self.in_flight = Some(page_index);
        Some(FetchRequest {
            room_id: self.room_id.clone(),
            page_index,
            page_size: self.page_size,
        })
    }

    /// Resolve the in-flight fetch, releasing the guard.
    ///
    /// Records `total_pages` from a successful page. Returns the result for
    /// the caller to apply or surface.
    pub fn complete(
        &mut self,
        result: Result<MessagePage, FetchError>,
    ) -> Result<MessagePage, FetchError> {
        self.in_flight = None;
        if let Ok(page) = &result {
            self.total_pages = Some(page.total_pages);
        }
        result
    }
}

/// Endpoint for fetching pages of past messages, credentialed against the
/// caller's session.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Fetch one page of past messages.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Status`] for non-2xx responses and
    /// [`FetchError::Network`] when no response was produced.
    async fn fetch_page(
        &self,
        room_id: &RoomId,
        page_index: u32,
        page_size: u32,
    ) -> Result<MessagePage, FetchError>;
}
