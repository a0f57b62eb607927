//! Generic runtime for room-view orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`RoomView`]: the room view state machine
//! - [`Session`]: the push-feed session state machine
//! - [`Driver`]: platform-specific I/O and presentation

use roomcast_client::{
    ClientIdentity, ConnectionState, DEFAULT_PAGE_SIZE, IdentityStore, Session, SessionAction,
    SessionConfig,
};
use roomcast_core::RoomId;

use crate::{AppAction, AppEvent, Driver, PushPoll, RoomView};

/// Generic runtime that orchestrates the room view, session, and driver.
pub struct Runtime<D>
where
    D: Driver,
{
    driver: D,
    view: RoomView,
    session: Session<D::Instant>,
    /// Last connection state reported to the view.
    reported_state: ConnectionState,
    redirected: bool,
}

impl<D> Runtime<D>
where
    D: Driver,
{
    /// Create a runtime for one room.
    ///
    /// The client identity is read from the store once at construction; a
    /// missing identity (no established session) gets a freshly generated
    /// one.
    pub fn new(driver: D, room_id: RoomId, store: &impl IdentityStore) -> Self {
        let identity = store
            .load()
            .map_or_else(ClientIdentity::generate, |stored| stored.client_chat_id);

        let session = Session::new(SessionConfig::default());
        let reported_state = session.state();
        Self {
            driver,
            view: RoomView::new(room_id, identity, DEFAULT_PAGE_SIZE),
            session,
            reported_state,
            redirected: false,
        }
    }

    /// Run the event loop until the view unmounts or redirects away.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let actions = self.view.handle(AppEvent::Mounted);
        self.process_actions(actions).await?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the runtime should stop.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await? {
            let actions = self.view.handle(event);
            self.process_actions(actions).await?;
        }

        if self.session.state() == ConnectionState::Connected {
            match self.driver.poll_push().await {
                PushPoll::Payload(payload) => {
                    let session_actions = self.session.handle_push(&payload);
                    let actions = self.handle_session_actions(session_actions).await?;
                    self.process_actions(actions).await?;
                },
                PushPoll::Idle => {},
                PushPoll::Closed => {
                    let now = self.driver.now();
                    self.session.transport_failure("push feed closed", now);
                },
            }
        }

        let now = self.driver.now();
        let session_actions = self.session.tick(now);
        let actions = self.handle_session_actions(session_actions).await?;
        self.process_actions(actions).await?;

        self.sync_connection_state().await?;

        Ok(self.redirected || !self.view.is_mounted())
    }

    /// Process actions returned by the view, draining follow-ups.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<(), D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.view)?,
                    AppAction::ScrollTo(target) => self.driver.scroll_to(target),
                    AppAction::Redirect => {
                        self.driver.redirect();
                        self.redirected = true;
                    },
                    AppAction::OpenSession { room_id } => {
                        let session_actions = self.session.open(room_id);
                        pending_actions.extend(self.handle_session_actions(session_actions).await?);
                    },
                    AppAction::CloseSession => {
                        let session_actions = self.session.close();
                        pending_actions.extend(self.handle_session_actions(session_actions).await?);
                    },
                    // Fire-and-forget: resolutions come back through
                    // poll_event, so a slow endpoint never parks the loop.
                    AppAction::FetchPage(request) => {
                        self.driver.start_fetch(request).await;
                    },
                    AppAction::Send(outgoing) => {
                        self.driver.start_send(outgoing).await;
                    },
                }
            }

            self.sync_connection_state_into(&mut pending_actions);
        }
        Ok(())
    }

    /// Execute session actions, returning any view actions they caused.
    async fn handle_session_actions(
        &mut self,
        session_actions: Vec<SessionAction>,
    ) -> Result<Vec<AppAction>, D::Error> {
        let mut actions = Vec::new();

        for session_action in session_actions {
            match session_action {
                SessionAction::Subscribe { room_id } => {
                    match self.driver.subscribe(&room_id).await {
                        Ok(()) => self.session.handshake_complete(),
                        Err(err) => {
                            let now = self.driver.now();
                            self.session.transport_failure(&err.to_string(), now);
                        },
                    }
                },
                SessionAction::Unsubscribe { room_id } => {
                    self.driver.unsubscribe(&room_id).await;
                },
                SessionAction::Deliver(message) => {
                    actions.extend(self.view.handle(AppEvent::MessageReceived(message)));
                },
            }
        }

        Ok(actions)
    }

    /// Report a changed session state to the view and process the result.
    async fn sync_connection_state(&mut self) -> Result<(), D::Error> {
        let mut actions = Vec::new();
        self.sync_connection_state_into(&mut actions);
        if !actions.is_empty() {
            self.process_actions(actions).await?;
        }
        Ok(())
    }

    fn sync_connection_state_into(&mut self, pending_actions: &mut Vec<AppAction>) {
        let state = self.session.state();
        if state != self.reported_state {
            self.reported_state = state;
            pending_actions.extend(self.view.handle(AppEvent::ConnectionChanged(state)));
        }
    }

    /// The room view, for inspection.
    pub fn view(&self) -> &RoomView {
        &self.view
    }

    /// The push-feed session, for inspection.
    pub fn session(&self) -> &Session<D::Instant> {
        &self.session
    }
}
