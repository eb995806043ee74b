use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

/// Represents a published message as delivered to subscribers.
///
/// This structure is serialized to JSON for delivery over WebSocket. The
/// payload is whatever survived the message hooks, so it may differ from
/// what the publisher sent.
///
/// # Fields
///
/// - `topic` - The name of the topic this message belongs to.
/// - `payload` - The message content, base64 when `encoding` says so.
/// - `timestamp` - Unix timestamp (seconds) of the publish.
/// - `encoding` - Absent for UTF-8 text payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<PayloadEncoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    Base64,
}

impl Message {
    /// Builds a message from raw payload bytes. Text stays as is; anything
    /// that is not valid UTF-8 is carried as base64 so no byte is lost.
    pub fn from_bytes(topic: impl Into<String>, payload: Vec<u8>, timestamp: i64) -> Self {
        let (payload, encoding) = match String::from_utf8(payload) {
            Ok(text) => (text, None),
            Err(e) => (BASE64.encode(e.into_bytes()), Some(PayloadEncoding::Base64)),
        };
        Self {
            topic: topic.into(),
            payload,
            timestamp,
            encoding,
        }
    }

    /// The payload bytes exactly as published (or rewritten).
    pub fn payload_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self.encoding {
            None => Ok(self.payload.clone().into_bytes()),
            Some(PayloadEncoding::Base64) => BASE64.decode(&self.payload),
        }
    }
}
