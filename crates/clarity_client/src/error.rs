//! Error types for the client. One enum per concern; none of them is fatal to
//! the session on its own.

use thiserror::Error;

/// A channel could not be created. Reported synchronously by `connect`.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No async runtime is available to drive the socket.
    #[error("duplex channels are not supported here: {0}")]
    Unsupported(String),
    #[error("agent address is not set")]
    MissingAddress,
    #[error("invalid agent address {url}: {reason}")]
    InvalidAddress { url: String, reason: String },
}

/// A frame could not even be buffered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("no channel is open or connecting")]
    NoChannel,
}

/// Transmission failure on a channel that is nominally open.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel is closed")]
    Closed,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An inbound frame that cannot be decoded.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no type")]
    MissingType,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to write audio clip: {0}")]
    Io(#[from] std::io::Error),
}

/// Config load/save error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
