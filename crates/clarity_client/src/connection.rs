//! Connection lifecycle: at most one duplex channel at a time, driven through
//! `Closed → Connecting → Open` and back to `Closed` on close or error.
//!
//! Frames sent while the channel is still connecting are held in an
//! [`OutboundBuffer`] and flushed, in order, when it opens. The manager never
//! blocks: the physical channel reports progress as [`ChannelEvent`]s, which
//! the owner feeds back through [`ConnectionManager::handle_event`].

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectError, SendError, TransportError};
use crate::messages::OutboundFrame;

pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// Generation number of a channel instance within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEventKind {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub channel: ChannelId,
    pub kind: ChannelEventKind,
}

/// Handle a channel implementation uses to report its progress.
#[derive(Debug, Clone)]
pub struct ChannelEvents {
    id: ChannelId,
    tx: EventSender,
}

impl ChannelEvents {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Each method returns false once the owning session is gone.
    pub fn opened(&self) -> bool {
        self.emit(ChannelEventKind::Opened)
    }

    pub fn message(&self, text: impl Into<String>) -> bool {
        self.emit(ChannelEventKind::Message(text.into()))
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.emit(ChannelEventKind::Error(reason.into()))
    }

    pub fn closed(&self) -> bool {
        self.emit(ChannelEventKind::Closed)
    }

    fn emit(&self, kind: ChannelEventKind) -> bool {
        self.tx
            .send(ChannelEvent {
                channel: self.id,
                kind,
            })
            .is_ok()
    }
}

/// Sending half of one physical channel. Dropping it closes the channel.
pub trait Channel {
    fn transmit(&mut self, text: String) -> Result<(), TransportError>;
}

/// Creates physical channels.
pub trait Connector {
    /// Start connecting to `url`. Must not block; progress is reported through
    /// `events`. An `Err` means no channel exists at all.
    fn open(&mut self, url: &str, events: ChannelEvents) -> Result<Box<dyn Channel>, ConnectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

/// What happened to a frame handed to [`ConnectionManager::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Buffered,
}

/// What the owner has to react to after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelUpdate {
    Opened,
    Frame(String),
    Closed,
    /// Stale or duplicate event; nothing changed.
    Ignored,
}

/// Frames accepted while the channel was not yet open. Kept unserialized.
#[derive(Debug, Clone, Default)]
pub struct OutboundBuffer {
    frames: VecDeque<OutboundFrame>,
}

impl OutboundBuffer {
    pub fn push(&mut self, frame: OutboundFrame) {
        self.frames.push_back(frame);
    }

    pub fn take_all(&mut self) -> Vec<OutboundFrame> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

struct ActiveChannel {
    id: ChannelId,
    handle: Box<dyn Channel>,
}

pub struct ConnectionManager<C> {
    connector: C,
    events: EventSender,
    state: ConnectionState,
    channel: Option<ActiveChannel>,
    next_id: u64,
    buffer: OutboundBuffer,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, events: EventSender) -> Self {
        Self {
            connector,
            events,
            state: ConnectionState::Closed,
            channel: None,
            next_id: 0,
            buffer: OutboundBuffer::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn current_channel(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|c| c.id)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    /// Create a channel to `url` unless one is already open or connecting.
    pub fn connect(&mut self, url: &str) -> Result<(), ConnectError> {
        match self.state {
            ConnectionState::Open => {
                debug!("channel already open");
                return Ok(());
            }
            ConnectionState::Connecting => {
                debug!("channel connection in progress");
                return Ok(());
            }
            ConnectionState::Closed => {}
        }

        if url.trim().is_empty() {
            error!("agent address is not set, cannot open a channel");
            return Err(ConnectError::MissingAddress);
        }

        let id = ChannelId(self.next_id);
        let events = ChannelEvents {
            id,
            tx: self.events.clone(),
        };
        let handle = self.connector.open(url, events).map_err(|e| {
            error!(error = %e, "failed to open channel");
            e
        })?;
        self.next_id += 1;
        info!(channel = %id, url, "connecting");
        self.channel = Some(ActiveChannel { id, handle });
        self.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Transmit now if open, buffer if connecting. Only fails when there is no
    /// channel at all. Transmission errors on an open channel are logged and
    /// swallowed.
    pub fn send(&mut self, frame: &OutboundFrame) -> Result<Delivery, SendError> {
        match (self.state, self.channel.as_mut()) {
            (ConnectionState::Open, Some(channel)) => {
                if let Err(e) = transmit(channel.handle.as_mut(), frame) {
                    warn!(channel = %channel.id, error = %e, "failed to send frame");
                }
                Ok(Delivery::Sent)
            }
            (ConnectionState::Connecting, Some(_)) => {
                self.buffer.push(frame.clone());
                debug!(buffered = self.buffer.len(), "channel not open yet, frame buffered");
                Ok(Delivery::Buffered)
            }
            _ => {
                error!("no channel, cannot send frame");
                Err(SendError::NoChannel)
            }
        }
    }

    /// Apply one event reported by a channel.
    pub fn handle_event(&mut self, event: ChannelEvent) -> ChannelUpdate {
        if self.current_channel() != Some(event.channel) {
            debug!(channel = %event.channel, "event from stale channel ignored");
            return ChannelUpdate::Ignored;
        }
        match event.kind {
            ChannelEventKind::Opened => {
                if self.state == ConnectionState::Open {
                    return ChannelUpdate::Ignored;
                }
                self.on_open();
                ChannelUpdate::Opened
            }
            ChannelEventKind::Message(text) => ChannelUpdate::Frame(text),
            ChannelEventKind::Error(reason) => {
                warn!(channel = %event.channel, %reason, "channel error");
                self.on_close();
                ChannelUpdate::Closed
            }
            ChannelEventKind::Closed => {
                info!(channel = %event.channel, "channel closed");
                self.on_close();
                ChannelUpdate::Closed
            }
        }
    }

    /// Drop the current channel, if any. Returns whether one existed.
    pub fn disconnect(&mut self) -> bool {
        let existed = self.channel.is_some();
        self.on_close();
        existed
    }

    fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        info!(channel = %channel.id, "channel open");
        for frame in self.buffer.take_all() {
            if let Err(e) = transmit(channel.handle.as_mut(), &frame) {
                warn!(channel = %channel.id, error = %e, "failed to flush buffered frame");
            }
        }
    }

    fn on_close(&mut self) {
        self.state = ConnectionState::Closed;
        self.channel = None;
        let dropped = self.buffer.take_all().len();
        if dropped > 0 {
            warn!(dropped, "discarding frames buffered for a closed channel");
        }
    }
}

fn transmit(channel: &mut dyn Channel, frame: &OutboundFrame) -> Result<(), TransportError> {
    let json = frame.to_json()?;
    channel.transmit(json)
}
