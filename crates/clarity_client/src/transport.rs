//! WebSocket channel over tokio-tungstenite.
//!
//! Each channel is one spawned pump task that owns the socket. The session
//! side keeps a [`WsChannel`] handle that queues outgoing text to the pump.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::connection::{Channel, ChannelEvents, Connector};
use crate::error::{ConnectError, TransportError};

/// Opens WebSocket channels on the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&mut self, url: &str, events: ChannelEvents) -> Result<Box<dyn Channel>, ConnectError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConnectError::Unsupported(e.to_string()))?;
        let request = url
            .into_client_request()
            .map_err(|e| ConnectError::InvalidAddress {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        runtime.spawn(pump(request, outgoing_rx, events));
        Ok(Box::new(WsChannel {
            outgoing: outgoing_tx,
        }))
    }
}

pub struct WsChannel {
    outgoing: mpsc::UnboundedSender<String>,
}

impl Channel for WsChannel {
    fn transmit(&mut self, text: String) -> Result<(), TransportError> {
        self.outgoing.send(text).map_err(|_| TransportError::Closed)
    }
}

async fn pump(
    request: Request,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    events: ChannelEvents,
) {
    let ws_stream = match tokio_tungstenite::connect_async(request).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            events.error(e.to_string());
            events.closed();
            return;
        }
    };
    if !events.opened() {
        return;
    }

    let (mut write, mut read) = ws_stream.split();
    loop {
        tokio::select! {
            next = outgoing.recv() => match next {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        events.error(e.to_string());
                        break;
                    }
                }
                None => {
                    // Handle dropped by the session.
                    debug!(channel = %events.id(), "closing socket");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if !events.message(text) {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.error(e.to_string());
                    break;
                }
            },
        }
    }
    events.closed();
}
