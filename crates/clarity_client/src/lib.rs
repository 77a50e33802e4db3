//! Streaming chat client: one persistent WebSocket per user carries journal
//! entries out and the agent's streamed replies (tokens, acknowledgements,
//! synthesized speech) back into an in-memory conversation log.

pub mod audio;
pub mod config;
pub mod connection;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod session;
pub mod tracker;
pub mod transport;

pub use audio::{AudioSink, NullSink, SpoolSink};
pub use config::{default_config_path, Config};
pub use connection::{
    Channel, ChannelEvent, ChannelEventKind, ChannelEvents, ChannelId, ChannelUpdate,
    ConnectionManager, ConnectionState, Connector, Delivery,
};
pub use conversation::{ChatEntry, ConversationLog, EntryId, Role};
pub use error::{ConfigError, ConnectError, FrameError, PlaybackError, SendError, TransportError};
pub use messages::{OutboundFrame, ServerFrame};
pub use session::{ChatSession, Identity, SessionSettings, StaticIdentity, Submission};
pub use tracker::PendingReplies;
pub use transport::WsConnector;
