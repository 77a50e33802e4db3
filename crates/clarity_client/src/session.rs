//! One chat session per authenticated user: owns the channel, the outbound
//! buffer, the pending-reply tracker and the conversation log.
//!
//! All mutation happens through `&mut ChatSession`, one event at a time:
//! either a caller [`submit`](ChatSession::submit)ting a turn, or a
//! [`ChannelEvent`] handed to [`handle_event`](ChatSession::handle_event).

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::audio::{AudioSink, NullSink};
use crate::config::{self, Config};
use crate::connection::{
    ChannelEvent, ChannelUpdate, ConnectionManager, Connector, Delivery, EventReceiver,
};
use crate::conversation::{ChatEntry, ConversationLog, EntryId};
use crate::dispatch::Dispatcher;
use crate::error::{ConnectError, SendError};
use crate::messages::{OutboundFrame, ServerFrame};
use crate::tracker::PendingReplies;

/// Used when the identity provider has no user yet.
pub const FALLBACK_USER_ID: &str = "1";

/// Source of the current user's id.
pub trait Identity {
    fn user_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl Identity for StaticIdentity {
    fn user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// `{ws_base}/ws/{user_id}`
pub fn target_url(ws_base: &str, user_id: &str) -> String {
    format!("{}/ws/{}", ws_base.trim_end_matches('/'), user_id)
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ws_base: String,
    pub ack_default: String,
    pub send_failure: String,
}

impl SessionSettings {
    pub fn new(ws_base: impl Into<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            ack_default: config::DEFAULT_ACK_TEXT.to_string(),
            send_failure: config::DEFAULT_SEND_FAILURE_TEXT.to_string(),
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            ws_base: cfg.agent_ws_base(),
            ack_default: cfg.ack_default().to_string(),
            send_failure: cfg.send_failure().to_string(),
        }
    }
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub user_entry: EntryId,
    pub reply_entry: EntryId,
    /// `Err` means the reply entry now holds the send-failure text.
    pub outcome: Result<Delivery, SendError>,
}

impl Submission {
    pub fn accepted(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct ChatSession<C> {
    connection: ConnectionManager<C>,
    events: EventReceiver,
    log: ConversationLog,
    pending: PendingReplies,
    identity: Box<dyn Identity>,
    audio: Box<dyn AudioSink>,
    settings: SessionSettings,
}

impl<C: Connector> ChatSession<C> {
    pub fn new(connector: C, settings: SessionSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            connection: ConnectionManager::new(connector, events_tx),
            events: events_rx,
            log: ConversationLog::new(),
            pending: PendingReplies::new(),
            identity: Box::new(StaticIdentity::default()),
            audio: Box::new(NullSink),
            settings,
        }
    }

    pub fn with_identity(mut self, identity: impl Identity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    pub fn pending(&self) -> &PendingReplies {
        &self.pending
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<C> {
        &mut self.connection
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn user_id(&self) -> String {
        self.identity
            .user_id()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_USER_ID.to_string())
    }

    pub fn target_url(&self) -> String {
        target_url(&self.settings.ws_base, &self.user_id())
    }

    /// Open a channel for the current user unless one is open or connecting.
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        let url = self.target_url();
        self.connection.connect(&url)
    }

    /// Append the user's turn and an empty reply placeholder, then send it.
    ///
    /// Returns once the frame is sent or buffered. If no channel exists or can
    /// be created, the placeholder becomes a visible error bubble instead.
    pub fn submit(&mut self, text: &str) -> Submission {
        if let Err(e) = self.connect() {
            warn!(error = %e, "submitting without a channel");
        }

        let user_entry = self.log.push(ChatEntry::user(text));
        let reply_entry = self.log.push(ChatEntry::assistant(""));
        self.pending.enqueue(reply_entry);

        let outcome = self.connection.send(&OutboundFrame::new_entry(text));
        if outcome.is_err() {
            self.log.replace_text(reply_entry, &self.settings.send_failure);
            self.pending.remove(reply_entry);
        }

        Submission {
            user_entry,
            reply_entry,
            outcome,
        }
    }

    /// Apply one channel event.
    pub fn handle_event(&mut self, event: ChannelEvent) {
        match self.connection.handle_event(event) {
            ChannelUpdate::Frame(text) => self.handle_frame(&text),
            ChannelUpdate::Closed => self.abandon_pending(),
            ChannelUpdate::Opened | ChannelUpdate::Ignored => {}
        }
    }

    /// Decode and dispatch one inbound frame. Malformed frames are dropped.
    pub fn handle_frame(&mut self, text: &str) {
        let frame = match ServerFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return;
            }
        };
        Dispatcher {
            log: &mut self.log,
            pending: &mut self.pending,
            audio: self.audio.as_mut(),
            ack_default: &self.settings.ack_default,
        }
        .dispatch(frame);
    }

    /// Apply every event already queued, without waiting. Returns how many.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next channel event. The session holds a sender itself, so
    /// this only resolves when a channel reports something.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Wait for one event and apply it.
    pub async fn process_next(&mut self) {
        if let Some(event) = self.next_event().await {
            self.handle_event(event);
        }
    }

    /// Close the channel and abandon every pending slot.
    pub fn disconnect(&mut self) {
        if self.connection.disconnect() {
            self.abandon_pending();
        }
    }

    /// Pending slots do not survive the channel. Placeholders that never got
    /// any text turn into the send-failure bubble.
    fn abandon_pending(&mut self) {
        for id in self.pending.clear() {
            let untouched = self.log.get(id).is_some_and(|e| e.text.is_empty());
            if untouched {
                debug!(entry = %id, "reply lost with the channel");
                self.log.replace_text(id, &self.settings.send_failure);
            }
        }
    }
}
