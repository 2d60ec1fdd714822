//! Wire-protocol DTOs for the client/server boundary.
//!
//! DESIGN
//! ======
//! Every frame is a JSON text frame. Outbound frames carry the session token
//! and the typed text; inbound frames carry either one chat message or the
//! server's recent-history snapshot as an array of messages.
//!
//! Inbound messages keep only what the client renders. The server echoes the
//! sender's `token` on broadcast messages; it is dropped at decode time so it
//! can never reach the transcript.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};

/// A message typed by the local user, as sent to the server.
///
/// Field order is part of the wire format: `{"token":..,"content":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    /// Opaque session credential injected by the page or obtained at login.
    pub token: String,
    /// Raw input text at send time. Not trimmed.
    pub content: String,
}

impl OutboundMessage {
    pub fn new(token: impl Into<String>, content: impl Into<String>) -> Self {
        Self { token: token.into(), content: content.into() }
    }

    /// Serialize into the JSON text frame payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error; in practice string-only
    /// structs always serialize.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A chat message broadcast by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the author, resolved by the server from the token.
    pub username: String,
    /// Message text exactly as the author typed it.
    pub content: String,
    /// Server-side stamp (`YYYY-MM-DD HH:MM:SS`), absent on older servers.
    #[serde(default, deserialize_with = "deserialize_optional_text", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self { username: username.into(), content: content.into(), timestamp: None }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// One decoded inbound text frame.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    /// A single new message; appended to the transcript.
    Message(ChatMessage),
    /// The server's bounded recent history; merged into the transcript.
    History(Vec<ChatMessage>),
}

/// Decode an inbound text frame.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed JSON, for objects missing
/// `username`/`content`, and for values that are neither an object nor an
/// array of objects.
pub fn decode_inbound(text: &str) -> Result<InboundFrame, serde_json::Error> {
    serde_json::from_str(text)
}

/// Treat `null` and the empty string as "not provided".
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.is_empty()))
}
