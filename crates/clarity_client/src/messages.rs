//! WebSocket frame types. Client ↔ agent JSON, discriminated by "type".

use serde::Serialize;

use crate::error::FrameError;

/// Client → agent frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "NEW_ENTRY")]
    NewEntry { payload: NewEntryPayload },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEntryPayload {
    pub raw_text: String,
}

impl OutboundFrame {
    pub fn new_entry(raw_text: impl Into<String>) -> Self {
        OutboundFrame::NewEntry {
            payload: NewEntryPayload {
                raw_text: raw_text.into(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One agent frame.
///
/// ACK and AUDIO end a turn whatever their body looks like, so their fields
/// are decoded leniently: a missing or non-string field is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Ack { status: String, text: Option<String> },
    Token(String),
    /// Base64 clip; `None` when the frame carried no usable payload.
    Audio(Option<String>),
    /// A kind this client does not know about. Ignored by the dispatcher.
    Unknown(String),
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, FrameError> {
        let typ = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(FrameError::MissingType)?;
        match typ {
            "ACK" => Ok(ServerFrame::Ack {
                status: string_field(value, "status").unwrap_or_default(),
                text: string_field(value, "text").filter(|t| !t.is_empty()),
            }),
            "TOKEN" => Ok(ServerFrame::Token(token_text(value.get("payload")))),
            "AUDIO" => Ok(ServerFrame::Audio(string_field(value, "payload"))),
            other => Ok(ServerFrame::Unknown(other.to_string())),
        }
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Token payloads are nominally strings; anything else is rendered as JSON
/// text, and a missing payload is empty.
fn token_text(payload: Option<&serde_json::Value>) -> String {
    match payload {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
