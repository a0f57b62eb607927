//! WebSocket and HTTP adapters for the client.
//!
//! Provides [`PushFeed`], a thin I/O layer that forwards raw push payloads
//! from a room's WebSocket topic over a channel, and [`HttpBackend`], the
//! reqwest-backed [`HistoryBackend`] and [`SendBackend`] implementation.
//! Protocol logic (reconnect, parsing, dedup) stays in the sans-IO
//! [`Session`](crate::Session) and [`HistoryLoader`](crate::HistoryLoader).

use async_trait::async_trait;
use futures::StreamExt;
use roomcast_core::{MessagePage, RoomId};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::{FetchError, HistoryBackend, OutgoingMessage, SendBackend, SendError};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP client construction failed.
    #[error("http client error: {0}")]
    Http(String),
}

/// Handle to a live push feed subscription.
///
/// Raw text payloads arrive on the channel; an internal task owns the
/// socket. Dropping the handle does not stop the task; call [`stop`] on
/// room-view unmount to avoid leaking a connection per navigation.
///
/// [`stop`]: PushFeed::stop
pub struct PushFeed {
    /// Raw push payloads from the server, in emission order.
    pub payloads: mpsc::Receiver<String>,
    /// Abort handle for the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl PushFeed {
    /// Stop the feed task and drop the socket.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Subscribe to a room's push topic over WebSocket.
///
/// The handshake has completed once this returns; feed the payloads into
/// [`Session::handle_push`](crate::Session::handle_push). Channel closure
/// signals a transport failure to be reported via
/// [`Session::transport_failure`](crate::Session::transport_failure).
pub async fn subscribe(base_url: &str, room_id: &RoomId) -> Result<PushFeed, TransportError> {
    let url = format!("{base_url}/ws/rooms/{room_id}");
    let (socket, _response) =
        connect_async(&url).await.map_err(|e| TransportError::Connection(e.to_string()))?;

    let (_write, mut read) = socket.split();
    let (tx, rx) = mpsc::channel::<String>(32);

    let handle = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    if tx.send(text.as_str().to_owned()).await.is_err() {
                        break;
                    }
                },
                Ok(WsMessage::Close(_)) => {
                    tracing::debug!("push feed closed by server");
                    break;
                },
                Ok(_) => {},
                Err(err) => {
                    tracing::warn!(%err, "push feed stream error");
                    break;
                },
            }
        }
    });

    Ok(PushFeed { payloads: rx, abort_handle: handle.abort_handle() })
}

/// Reqwest-backed history and send endpoints.
///
/// Requests carry the session cookie jar, matching the product's
/// credentialed fetches.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend rooted at the API base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl HistoryBackend for HttpBackend {
    async fn fetch_page(
        &self,
        room_id: &RoomId,
        page_index: u32,
        page_size: u32,
    ) -> Result<MessagePage, FetchError> {
        let url = format!("{}/api/rooms/{room_id}/messages", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[("page", page_index), ("size", page_size)])
            .send()
            .await
            .map_err(|e| FetchError::Network { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }

        response
            .json::<MessagePage>()
            .await
            .map_err(|e| FetchError::Network { reason: e.to_string() })
    }
}

#[async_trait]
impl SendBackend for HttpBackend {
    async fn send(&self, outgoing: &OutgoingMessage) -> Result<(), SendError> {
        let url = format!("{}/api/rooms/{}/messages", self.base_url, outgoing.room_id);
        let response = self
            .client
            .post(url)
            .json(outgoing)
            .send()
            .await
            .map_err(|e| SendError::Network { reason: e.to_string() })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SendError::Rejected { status: status.as_u16() })
        }
    }
}
