//! Message Stream Reducer.
//!
//! The ordered, deduplicated, append-only view of a room's messages. Merges
//! history pages (prepended) with live pushes (appended) and resolves the
//! sender's own optimistic echo against its server broadcast.
//!
//! # Invariants
//!
//! - Entries are ordered non-decreasingly by server timestamp; ties break by
//!   arrival order. History pages are internally ordered oldest to newest,
//!   and live pushes always land after all currently-held messages, so no
//!   global re-sort is ever needed (common-case append is O(1)).
//! - `prepend_page` is idempotent per page index: a duplicate network
//!   response (e.g. a slow retry resolving after success) leaves the list
//!   unchanged.
//! - At most one entry exists per delivered self-sent message: the server
//!   broadcast replaces the matching optimistic echo in place instead of
//!   appending a duplicate. The replacement keeps the echo's position even
//!   though it adopts the server timestamp, so a push delivered between
//!   submit and broadcast stays where the reader already saw it.

use std::collections::BTreeSet;

use crate::{ClientIdentity, Message, MessagePage, Origin};

/// What `append_live` did with an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Message was appended at the end of the stream.
    Appended,
    /// Message replaced a pending optimistic echo in place.
    ReplacedEcho,
}

/// Ordered message list for one room view.
///
/// Created empty when the room view mounts, populated by one initial history
/// fetch and grown by further backfill and live pushes. Discarded entirely
/// when the view unmounts; nothing persists across room switches.
#[derive(Debug, Clone)]
pub struct MessageStream {
    /// Identity used to derive [`Origin`] at insertion time.
    local_identity: ClientIdentity,
    /// Messages in display order, oldest first.
    entries: Vec<Message>,
    /// Page indices already applied. Guards duplicate prepends.
    applied_pages: BTreeSet<u32>,
    /// Indices of optimistic echoes awaiting their server broadcast,
    /// oldest submission first.
    pending_echoes: Vec<usize>,
}

impl MessageStream {
    /// Create an empty stream for the given local identity.
    pub fn new(local_identity: ClientIdentity) -> Self {
        Self {
            local_identity,
            entries: Vec::new(),
            applied_pages: BTreeSet::new(),
            pending_echoes: Vec::new(),
        }
    }

    /// Messages in display order, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stream holds no messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a page index has already been applied.
    pub fn page_applied(&self, page_index: u32) -> bool {
        self.applied_pages.contains(&page_index)
    }

    /// Highest page index applied so far. `None` before the initial fetch.
    pub fn highest_applied_page(&self) -> Option<u32> {
        self.applied_pages.last().copied()
    }

    /// Server timestamp of the newest message. `None` when empty.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.entries.last().map(|m| m.timestamp)
    }

    /// Number of optimistic echoes still awaiting their broadcast.
    pub fn pending_echo_count(&self) -> usize {
        self.pending_echoes.len()
    }

    /// Insert a history page before the current earliest message.
    ///
    /// Pages are disjoint by construction, so no cross-page dedup is needed;
    /// the only guard is idempotence against a page index that was already
    /// applied. Returns `false` (and changes nothing) for such duplicates.
    pub fn prepend_page(&mut self, page: MessagePage) -> bool {
        if !self.applied_pages.insert(page.page_index) {
            return false;
        }

        let inserted = page.messages.len();
        let prepared = page.messages.into_iter().map(|mut msg| {
            msg.origin = self.derive_origin(&msg.sender_client_id);
            msg.pending = false;
            msg
        });
        self.entries.splice(0..0, prepared.collect::<Vec<_>>());

        // Echo bookkeeping points into `entries`; shift past the insert.
        for idx in &mut self.pending_echoes {
            *idx += inserted;
        }

        true
    }

    /// Append a live push at the end of the stream.
    ///
    /// If the message is self-sent and an optimistic echo with the same text
    /// is still pending, the broadcast replaces that echo in place (adopting
    /// the server's timestamp and display metadata). Everything else is a
    /// plain append.
    pub fn append_live(&mut self, mut message: Message) -> AppendOutcome {
        message.origin = self.derive_origin(&message.sender_client_id);
        message.pending = false;

        if message.origin == Origin::Own
            && let Some(pos) =
                self.pending_echoes.iter().position(|&idx| self.entries[idx].text == message.text)
        {
            let entry_idx = self.pending_echoes.remove(pos);
            self.entries[entry_idx] = message;
            return AppendOutcome::ReplacedEcho;
        }

        self.entries.push(message);
        AppendOutcome::Appended
    }

    /// Append an optimistic local echo for a just-submitted message.
    ///
    /// The echo carries the stream's latest timestamp so the ordering
    /// invariant holds until the server broadcast replaces it with the
    /// authoritative instant.
    pub fn append_local_echo(&mut self, text: impl Into<String>) {
        let timestamp = self.latest_timestamp().unwrap_or(0);
        let mut echo = Message::new(self.local_identity.clone(), text, timestamp);
        echo.origin = Origin::Own;
        echo.pending = true;

        self.pending_echoes.push(self.entries.len());
        self.entries.push(echo);
    }

    fn derive_origin(&self, sender: &ClientIdentity) -> Origin {
        if *sender == self.local_identity { Origin::Own } else { Origin::Other }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> ClientIdentity {
        ClientIdentity::new("local-session")
    }

    fn other_msg(text: &str, ts: u64) -> Message {
        Message::new(ClientIdentity::new("someone-else"), text, ts)
    }

    fn page(index: u32, total: u32, messages: Vec<Message>) -> MessagePage {
        MessagePage { messages, page_index: index, total_pages: total }
    }

    #[test]
    fn initial_page_populates_in_order() {
        let mut stream = MessageStream::new(me());
        let messages: Vec<_> = (0..15).map(|i| other_msg(&format!("m{i}"), 100 + i)).collect();

        assert!(stream.prepend_page(page(0, 1, messages)));
        assert_eq!(stream.len(), 15);
        assert_eq!(stream.messages()[0].text, "m0");
        assert_eq!(stream.messages()[14].text, "m14");
    }

    #[test]
    fn older_page_lands_before_newer_page() {
        let mut stream = MessageStream::new(me());
        stream.prepend_page(page(0, 3, vec![other_msg("newer-a", 200), other_msg("newer-b", 201)]));
        stream.prepend_page(page(1, 3, vec![other_msg("older-a", 100), other_msg("older-b", 101)]));

        let texts: Vec<_> = stream.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["older-a", "older-b", "newer-a", "newer-b"]);

        let timestamps: Vec<_> = stream.messages().iter().map(|m| m.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn duplicate_page_is_a_no_op() {
        let mut stream = MessageStream::new(me());
        assert!(stream.prepend_page(page(0, 2, vec![other_msg("a", 1)])));

        let before = stream.messages().to_vec();
        assert!(!stream.prepend_page(page(0, 2, vec![other_msg("a", 1)])));
        assert_eq!(stream.messages(), before.as_slice());
    }

    #[test]
    fn live_push_appends_after_history() {
        let mut stream = MessageStream::new(me());
        stream.prepend_page(page(0, 1, vec![other_msg("old", 10)]));

        assert_eq!(stream.append_live(other_msg("new", 20)), AppendOutcome::Appended);
        assert_eq!(stream.messages().last().map(|m| m.text.as_str()), Some("new"));
    }

    #[test]
    fn origin_is_derived_at_insertion() {
        let mut stream = MessageStream::new(me());
        stream.append_live(Message::new(me(), "mine", 5));
        stream.append_live(other_msg("theirs", 6));

        assert_eq!(stream.messages()[0].origin, Origin::Own);
        assert_eq!(stream.messages()[1].origin, Origin::Other);
    }

    #[test]
    fn echo_is_replaced_by_its_broadcast() {
        let mut stream = MessageStream::new(me());
        stream.append_local_echo("hello room");
        assert_eq!(stream.pending_echo_count(), 1);
        assert!(stream.messages()[0].pending);

        let mut broadcast = Message::new(me(), "hello room", 42);
        broadcast.author_name = Some("Ada".into());
        assert_eq!(stream.append_live(broadcast), AppendOutcome::ReplacedEcho);

        // Exactly one copy, now confirmed with the server's metadata
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.pending_echo_count(), 0);
        let entry = &stream.messages()[0];
        assert!(!entry.pending);
        assert_eq!(entry.timestamp, 42);
        assert_eq!(entry.author_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn echo_survives_a_prepend_in_between() {
        let mut stream = MessageStream::new(me());
        stream.prepend_page(page(0, 2, vec![other_msg("recent", 100)]));
        stream.append_local_echo("on its way");

        // Backfill lands while the send is pending; indices must shift
        stream.prepend_page(page(1, 2, vec![other_msg("ancient-a", 1), other_msg("ancient-b", 2)]));

        let outcome = stream.append_live(Message::new(me(), "on its way", 150));
        assert_eq!(outcome, AppendOutcome::ReplacedEcho);
        assert_eq!(stream.len(), 4);
        assert_eq!(stream.messages()[3].timestamp, 150);
    }

    #[test]
    fn self_sent_without_echo_appends_once() {
        let mut stream = MessageStream::new(me());
        assert_eq!(stream.append_live(Message::new(me(), "direct", 9)), AppendOutcome::Appended);
        assert_eq!(stream.len(), 1);
    }

    #[test]
    fn identical_texts_resolve_oldest_echo_first() {
        let mut stream = MessageStream::new(me());
        stream.append_local_echo("again");
        stream.append_local_echo("again");

        stream.append_live(Message::new(me(), "again", 7));
        assert_eq!(stream.pending_echo_count(), 1);
        assert!(!stream.messages()[0].pending);
        assert!(stream.messages()[1].pending);
    }
}
