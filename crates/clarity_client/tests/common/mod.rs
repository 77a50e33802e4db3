//! In-memory connector that records every channel it opens and every frame
//! transmitted, so tests can fire channel events by hand.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use clarity_client::session::SessionSettings;
use clarity_client::{Channel, ChannelEvents, ChatSession, ConnectError, Connector, TransportError};

#[derive(Default)]
struct Recorded {
    opened: Vec<(String, ChannelEvents)>,
    sent: Vec<String>,
    refuse: bool,
    fail_next: usize,
}

#[derive(Clone, Default)]
pub struct RecordingConnector {
    shared: Arc<Mutex<Recorded>>,
}

impl RecordingConnector {
    /// A connector for an environment where channels cannot exist.
    pub fn refusing() -> Self {
        let connector = Self::default();
        connector.shared.lock().unwrap().refuse = true;
        connector
    }

    pub fn opened_count(&self) -> usize {
        self.shared.lock().unwrap().opened.len()
    }

    pub fn url(&self, n: usize) -> String {
        self.shared.lock().unwrap().opened[n].0.clone()
    }

    /// Event handle of the `n`th channel opened.
    pub fn events(&self, n: usize) -> ChannelEvents {
        self.shared.lock().unwrap().opened[n].1.clone()
    }

    /// Raw JSON of every frame transmitted so far.
    pub fn sent(&self) -> Vec<String> {
        self.shared.lock().unwrap().sent.clone()
    }

    /// `raw_text` of every NEW_ENTRY frame transmitted so far.
    pub fn sent_entries(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|json| {
                let value: serde_json::Value = serde_json::from_str(json).unwrap();
                assert_eq!(value["type"], "NEW_ENTRY");
                value["payload"]["raw_text"].as_str().unwrap().to_string()
            })
            .collect()
    }

    pub fn fail_next_transmits(&self, n: usize) {
        self.shared.lock().unwrap().fail_next = n;
    }
}

struct RecordingChannel {
    shared: Arc<Mutex<Recorded>>,
}

impl Channel for RecordingChannel {
    fn transmit(&mut self, text: String) -> Result<(), TransportError> {
        let mut recorded = self.shared.lock().unwrap();
        if recorded.fail_next > 0 {
            recorded.fail_next -= 1;
            return Err(TransportError::Closed);
        }
        recorded.sent.push(text);
        Ok(())
    }
}

impl Connector for RecordingConnector {
    fn open(&mut self, url: &str, events: ChannelEvents) -> Result<Box<dyn Channel>, ConnectError> {
        let mut recorded = self.shared.lock().unwrap();
        if recorded.refuse {
            return Err(ConnectError::Unsupported("no sockets in this test".into()));
        }
        recorded.opened.push((url.to_string(), events));
        Ok(Box::new(RecordingChannel {
            shared: Arc::clone(&self.shared),
        }))
    }
}

pub fn session(connector: &RecordingConnector) -> ChatSession<RecordingConnector> {
    ChatSession::new(connector.clone(), SessionSettings::new("ws://agent.test"))
}

/// Open channel `n` and let the session see it.
pub fn open(session: &mut ChatSession<RecordingConnector>, connector: &RecordingConnector, n: usize) {
    assert!(connector.events(n).opened());
    session.process_pending();
}

/// Deliver one inbound frame on channel `n`.
pub fn deliver(
    session: &mut ChatSession<RecordingConnector>,
    connector: &RecordingConnector,
    n: usize,
    frame: &str,
) {
    assert!(connector.events(n).message(frame));
    session.process_pending();
}
