//! Room view state machine.
//!
//! [`RoomView`] is the single owner of everything one mounted chat room
//! shows: the message stream reducer, the viewport coordinator, the
//! composer, and the history fetch bookkeeping. It is a pure state machine:
//! it consumes [`AppEvent`] inputs and produces [`AppAction`] instructions
//! for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Merges history pages and live pushes into the reducer.
//! - Decides scroll corrections (follow the tail, preserve the anchor).
//! - Triggers backfill when the reader hits the top edge.
//! - Tags outgoing messages with the local session identity.
//! - Ignores late completions after unmount (teardown safety).

use roomcast_client::{ConnectionState, FetchError, HistoryLoader, OutgoingMessage};
use roomcast_core::{ClientIdentity, Message, MessagePage, MessageStream, RoomId};

use crate::{AppAction, AppEvent, Composer, ScrollTarget, Viewport};

/// State machine for one mounted room view.
///
/// Created when the room view mounts, discarded when it unmounts. Nothing
/// persists across room switches.
#[derive(Debug, Clone)]
pub struct RoomView {
    room_id: RoomId,
    identity: ClientIdentity,
    stream: MessageStream,
    viewport: Viewport,
    composer: Composer,
    loader: HistoryLoader,
    /// Session state copy, for status display only.
    connection: ConnectionState,
    /// Transient status line. `None` if no message.
    status_message: Option<String>,
    mounted: bool,
}

impl RoomView {
    /// Create a view for a room with the local session identity.
    pub fn new(room_id: RoomId, identity: ClientIdentity, page_size: u32) -> Self {
        Self {
            room_id: room_id.clone(),
            identity: identity.clone(),
            stream: MessageStream::new(identity),
            viewport: Viewport::default(),
            composer: Composer::default(),
            loader: HistoryLoader::new(room_id, page_size),
            connection: ConnectionState::Disconnected,
            status_message: None,
            mounted: false,
        }
    }

    /// Process an event and return actions for the runtime.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Mounted => self.handle_mounted(),
            AppEvent::ConnectionChanged(state) => {
                self.connection = state;
                vec![AppAction::Render]
            },
            AppEvent::MessageReceived(message) => self.handle_message(message),
            AppEvent::PageResolved { result } => self.handle_page(result),
            AppEvent::Scrolled { metrics } => {
                self.viewport.update(metrics);
                self.maybe_backfill()
            },
            AppEvent::DraftEdited { text } => {
                self.composer.set_draft(text);
                vec![AppAction::Render]
            },
            AppEvent::AssistToggled => {
                self.composer.toggle_assist();
                vec![AppAction::Render]
            },
            AppEvent::SubmitRequested => self.handle_submit(),
            AppEvent::SendFailed { reason } => {
                self.status_message = Some(format!("Message not sent: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::Unmounted => {
                self.mounted = false;
                vec![AppAction::CloseSession]
            },
        }
    }

    fn handle_mounted(&mut self) -> Vec<AppAction> {
        if self.mounted {
            return vec![];
        }
        self.mounted = true;

        let mut actions = vec![AppAction::OpenSession { room_id: self.room_id.clone() }];
        if let Some(request) = self.loader.request(0) {
            actions.push(AppAction::FetchPage(request));
        }
        actions.push(AppAction::Render);
        actions
    }

    fn handle_message(&mut self, message: Message) -> Vec<AppAction> {
        if !self.mounted {
            // Late delivery after teardown; the reducer no longer exists
            // from the UI's point of view.
            return vec![];
        }

        self.stream.append_live(message);

        let mut actions = Vec::new();
        if let Some(target) = self.viewport.append_target() {
            actions.push(AppAction::ScrollTo(target));
        }
        actions.push(AppAction::Render);
        actions
    }

    fn handle_page(&mut self, result: Result<MessagePage, FetchError>) -> Vec<AppAction> {
        if !self.mounted {
            tracing::debug!(room = %self.room_id, "page resolved after unmount, discarding");
            return vec![];
        }

        match self.loader.complete(result) {
            Ok(page) => {
                let initial = self.stream.is_empty();
                // Anchor must be captured before the mutation renders
                let anchor = self.viewport.prepend_anchor();

                if !self.stream.prepend_page(page) {
                    tracing::debug!(room = %self.room_id, "duplicate page response ignored");
                    return vec![AppAction::Render];
                }

                let target = if initial {
                    // First load: no prior reading position to preserve
                    ScrollTarget::Bottom
                } else {
                    anchor
                };
                vec![AppAction::ScrollTo(target), AppAction::Render]
            },
            Err(err) if err.is_auth() => {
                tracing::warn!(room = %self.room_id, %err, "not authorized for room");
                vec![AppAction::Redirect]
            },
            Err(err) => {
                self.status_message = Some(format!("Could not load history: {err}"));
                vec![AppAction::Render]
            },
        }
    }

    fn maybe_backfill(&mut self) -> Vec<AppAction> {
        if !self.mounted || !self.viewport.at_top() {
            return vec![];
        }

        let next = self.stream.highest_applied_page().map_or(0, |p| p + 1);
        if !self.loader.has_more(next) {
            return vec![];
        }

        // None while a fetch is pending: the single-flight guard holds
        self.loader
            .request(next)
            .map(|request| vec![AppAction::FetchPage(request)])
            .unwrap_or_default()
    }

    fn handle_submit(&mut self) -> Vec<AppAction> {
        if !self.mounted {
            // A stray submit after teardown must not echo or hit the network.
            return vec![];
        }

        let Some(draft) = self.composer.submit() else {
            // Whitespace-only drafts never reach the network
            return vec![];
        };

        self.stream.append_local_echo(draft.text.clone());

        let outgoing = OutgoingMessage {
            room_id: self.room_id.clone(),
            text: draft.text,
            assist_requested: draft.assist_requested,
            client_chat_id: self.identity.clone(),
        };

        vec![
            AppAction::Send(outgoing),
            AppAction::ScrollTo(ScrollTarget::Bottom),
            AppAction::Render,
        ]
    }

    /// Room this view shows.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Message stream, for rendering.
    pub fn stream(&self) -> &MessageStream {
        &self.stream
    }

    /// Session state copy, for status display.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Composer state, for rendering the input row.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Whether the view is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

#[cfg(test)]
mod tests {
    use roomcast_core::{ClientIdentity, Message, MessagePage};

    use super::*;
    use crate::ViewportMetrics;

    const PAGE_SIZE: u32 = 15;

    fn local() -> ClientIdentity {
        ClientIdentity::new("local-session")
    }

    fn mounted_view() -> RoomView {
        let mut view = RoomView::new(RoomId::new("lobby"), local(), PAGE_SIZE);
        let _ = view.handle(AppEvent::Mounted);
        view
    }

    fn page(index: u32, total: u32, count: usize, base_ts: u64) -> MessagePage {
        let messages = (0..count)
            .map(|i| {
                Message::new(
                    ClientIdentity::new("peer"),
                    format!("p{index}-m{i}"),
                    base_ts + i as u64,
                )
            })
            .collect();
        MessagePage { messages, page_index: index, total_pages: total }
    }

    fn resolve(view: &mut RoomView, p: MessagePage) -> Vec<AppAction> {
        view.handle(AppEvent::PageResolved { result: Ok(p) })
    }

    #[test]
    fn mount_opens_session_and_fetches_first_page() {
        let mut view = RoomView::new(RoomId::new("lobby"), local(), PAGE_SIZE);
        let actions = view.handle(AppEvent::Mounted);

        assert!(matches!(actions.as_slice(), [
            AppAction::OpenSession { .. },
            AppAction::FetchPage(_),
            AppAction::Render
        ]));
    }

    #[test]
    fn initial_page_scrolls_to_bottom_unconditionally() {
        let mut view = mounted_view();
        let actions = resolve(&mut view, page(0, 1, 15, 1000));

        assert_eq!(view.stream().len(), 15);
        assert!(matches!(actions.as_slice(), [
            AppAction::ScrollTo(ScrollTarget::Bottom),
            AppAction::Render
        ]));
    }

    #[test]
    fn backfill_preserves_the_anchor() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 3, 15, 1000));

        // Reader scrolls to the top edge
        let actions = view.handle(AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        });
        assert!(
            matches!(actions.as_slice(), [AppAction::FetchPage(req)] if req.page_index == 1),
            "top edge with pages remaining requests the next page"
        );

        let actions = resolve(&mut view, page(1, 3, 15, 500));
        assert_eq!(view.stream().len(), 30);
        assert!(matches!(
            actions.as_slice(),
            [
                AppAction::ScrollTo(ScrollTarget::Anchor { prior_top, prior_height }),
                AppAction::Render
            ] if *prior_top == 0.0 && *prior_height == 2000.0
        ));

        // Chronological order across the merge
        let timestamps: Vec<_> = view.stream().messages().iter().map(|m| m.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted);
    }

    #[test]
    fn no_second_fetch_while_one_is_pending() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 3, 15, 1000));

        let at_top = AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        };
        assert_eq!(view.handle(at_top.clone()).len(), 1, "first trigger fetches");
        assert!(view.handle(at_top).is_empty(), "second trigger is suppressed");
    }

    #[test]
    fn no_backfill_when_all_pages_are_loaded() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 1, 15, 1000));

        let actions = view.handle(AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        });
        assert!(actions.is_empty());
    }

    #[test]
    fn push_while_reading_history_does_not_move_the_viewport() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 1, 15, 1000));

        // Scrolled up 500px from the bottom
        let _ = view.handle(AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 900.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        });

        let push = Message::new(ClientIdentity::new("peer"), "new message", 2000);
        let actions = view.handle(AppEvent::MessageReceived(push));

        assert_eq!(view.stream().len(), 16, "message is appended");
        assert!(
            matches!(actions.as_slice(), [AppAction::Render]),
            "no scroll action while reading history"
        );
    }

    #[test]
    fn push_while_following_the_tail_scrolls_down() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 1, 15, 1000));

        let _ = view.handle(AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 1400.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        });

        let push = Message::new(ClientIdentity::new("peer"), "new message", 2000);
        let actions = view.handle(AppEvent::MessageReceived(push));

        assert!(matches!(actions.as_slice(), [
            AppAction::ScrollTo(ScrollTarget::Bottom),
            AppAction::Render
        ]));
    }

    #[test]
    fn submit_sends_tagged_message_and_echoes() {
        let mut view = mounted_view();
        let _ = view.handle(AppEvent::DraftEdited { text: "hello room".into() });
        let _ = view.handle(AppEvent::AssistToggled);

        let actions = view.handle(AppEvent::SubmitRequested);
        match actions.as_slice() {
            [AppAction::Send(outgoing), AppAction::ScrollTo(ScrollTarget::Bottom), AppAction::Render] =>
            {
                assert_eq!(outgoing.text, "hello room");
                assert!(outgoing.assist_requested);
                assert_eq!(outgoing.client_chat_id, local());
                assert_eq!(outgoing.room_id, RoomId::new("lobby"));
            },
            other => panic!("unexpected actions: {other:?}"),
        }

        assert_eq!(view.stream().pending_echo_count(), 1, "optimistic echo shown");
        assert_eq!(view.composer().draft(), "", "draft cleared on submit attempt");
    }

    #[test]
    fn whitespace_submit_never_reaches_the_network() {
        let mut view = mounted_view();
        let _ = view.handle(AppEvent::DraftEdited { text: "   ".into() });

        assert!(view.handle(AppEvent::SubmitRequested).is_empty());
        assert_eq!(view.stream().pending_echo_count(), 0);
    }

    #[test]
    fn own_broadcast_replaces_the_echo() {
        let mut view = mounted_view();
        let _ = view.handle(AppEvent::DraftEdited { text: "hello room".into() });
        let _ = view.handle(AppEvent::SubmitRequested);
        assert_eq!(view.stream().len(), 1);

        let echo = Message::new(local(), "hello room", 3000);
        let _ = view.handle(AppEvent::MessageReceived(echo));

        assert_eq!(view.stream().len(), 1, "no duplicate for self-sent message");
        assert_eq!(view.stream().pending_echo_count(), 0);
    }

    #[test]
    fn events_after_unmount_are_no_ops() {
        let mut view = mounted_view();
        let _ = resolve(&mut view, page(0, 2, 15, 1000));

        let actions = view.handle(AppEvent::Unmounted);
        assert!(matches!(actions.as_slice(), [AppAction::CloseSession]));

        // Late push and late fetch completion must not mutate anything
        let push = Message::new(ClientIdentity::new("peer"), "late", 9000);
        assert!(view.handle(AppEvent::MessageReceived(push)).is_empty());
        assert!(resolve(&mut view, page(1, 2, 15, 500)).is_empty());
        assert_eq!(view.stream().len(), 15);
    }

    #[test]
    fn submit_after_unmount_is_inert() {
        let mut view = mounted_view();
        let _ = view.handle(AppEvent::DraftEdited { text: "after close".into() });
        let _ = view.handle(AppEvent::Unmounted);

        assert!(view.handle(AppEvent::SubmitRequested).is_empty());
        assert!(view.stream().is_empty(), "no echo lands on the torn-down stream");
        assert_eq!(view.stream().pending_echo_count(), 0);
    }

    #[test]
    fn send_failure_surfaces_without_restoring_the_draft() {
        let mut view = mounted_view();
        let _ = view.handle(AppEvent::DraftEdited { text: "hello".into() });
        let _ = view.handle(AppEvent::SubmitRequested);

        let actions = view.handle(AppEvent::SendFailed { reason: "503".into() });
        assert!(matches!(actions.as_slice(), [AppAction::Render]));
        assert!(view.status_message().is_some());
        assert_eq!(view.composer().draft(), "");
    }

    #[test]
    fn auth_failure_redirects() {
        let mut view = mounted_view();
        let actions = view.handle(AppEvent::PageResolved {
            result: Err(roomcast_client::FetchError::Status { status: 403 }),
        });

        assert!(matches!(actions.as_slice(), [AppAction::Redirect]));
    }

    #[test]
    fn transient_fetch_failure_is_a_status_notice() {
        let mut view = mounted_view();
        let actions = view.handle(AppEvent::PageResolved {
            result: Err(roomcast_client::FetchError::Status { status: 500 }),
        });

        assert!(matches!(actions.as_slice(), [AppAction::Render]));
        assert!(view.status_message().unwrap().contains("history"));

        // Guard released: scrolling again retries
        let actions = view.handle(AppEvent::Scrolled {
            metrics: ViewportMetrics {
                scroll_top: 0.0,
                scroll_height: 2000.0,
                viewport_height: 600.0,
            },
        });
        assert!(matches!(actions.as_slice(), [AppAction::FetchPage(_)]));
    }
}
