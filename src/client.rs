//! Chat client core: the send path and the receive path.
//!
//! SYSTEM CONTEXT
//! ==============
//! Hosts own the transport and the widgets. They call [`ChatClient::send`]
//! when the user triggers a send and [`ChatClient::receive`] for every
//! inbound text frame, passing their [`ChatView`] and [`FrameSink`]
//! implementations. Hosts also report socket lifecycle changes through
//! [`ChatClient::set_status`].
//!
//! ERROR HANDLING
//! ==============
//! Errors are returned, never swallowed here. Hosts log them and carry on:
//! a malformed frame must not stop later frames from rendering, and a failed
//! send leaves the input untouched so the user can retry.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use crate::config::ClientConfig;
use crate::net::types::{InboundFrame, OutboundMessage, decode_inbound};
use crate::state::chat::{ChatState, SnapshotMerge};
use crate::state::connection::ConnectionStatus;
use crate::util::render::ChatLine;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("socket is not open ({0})")]
    NotConnected(ConnectionStatus),
    #[error("failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode inbound frame: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outbound transport for serialized text frames.
pub trait FrameSink {
    /// Queue or transmit one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] or [`ClientError::Transport`]
    /// when the frame cannot be handed to the socket.
    fn send_text(&mut self, text: String) -> Result<(), ClientError>;
}

/// The input field and the message list a host renders into.
pub trait ChatView {
    /// Current text of the input field.
    fn input_text(&self) -> String;
    fn clear_input(&mut self);
    fn append_line(&mut self, line: &ChatLine);
    /// Drop the `count` oldest lines.
    fn remove_oldest(&mut self, count: usize);
    /// Replace every line with `lines`.
    fn replace_lines(&mut self, lines: &[ChatLine]);
    /// Scroll the message list so the latest line is visible.
    fn scroll_to_latest(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The input was empty or whitespace only; nothing was sent.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    Appended { added: usize, evicted: usize },
    Replaced { count: usize },
}

#[derive(Debug)]
pub struct ChatClient {
    config: ClientConfig,
    chat: ChatState,
    status: ConnectionStatus,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        let chat = ChatState::new(config.history_limit);
        Self { config, chat, status: ConnectionStatus::default() }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            log::debug!("connection {} -> {status}", self.status);
            self.status = status;
        }
    }

    /// Send the view's input text as `{"token", "content"}`.
    ///
    /// Whitespace-only input is skipped and left as is. On success the input
    /// is cleared; on any error it is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] when the socket is not open,
    /// and whatever the sink returns when it rejects the frame.
    pub fn send<V, S>(&mut self, view: &mut V, sink: &mut S) -> Result<SendOutcome, ClientError>
    where
        V: ChatView + ?Sized,
        S: FrameSink + ?Sized,
    {
        let content = view.input_text();
        if content.trim().is_empty() {
            return Ok(SendOutcome::Skipped);
        }
        if !self.status.is_connected() {
            return Err(ClientError::NotConnected(self.status));
        }

        let text = OutboundMessage::new(self.config.token.as_str(), content)
            .encode()
            .map_err(ClientError::Encode)?;
        sink.send_text(text)?;
        view.clear_input();
        log::debug!("chat message sent");
        Ok(SendOutcome::Sent)
    }

    /// Apply one inbound text frame to the transcript and the view.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] for a frame that is not a chat message
    /// or history array; state and view are left unchanged.
    pub fn receive<V>(&mut self, text: &str, view: &mut V) -> Result<Received, ClientError>
    where
        V: ChatView + ?Sized,
    {
        let frame = decode_inbound(text).map_err(ClientError::Decode)?;
        let received = match frame {
            InboundFrame::Message(message) => {
                let line = ChatLine::from(&message);
                let evicted = self.chat.push(message);
                view.append_line(&line);
                if evicted > 0 {
                    view.remove_oldest(evicted);
                }
                Received::Appended { added: 1, evicted }
            }
            InboundFrame::History(snapshot) => match self.chat.merge_snapshot(snapshot) {
                SnapshotMerge::Appended { added, evicted } => {
                    // New messages the limit already dropped never reach the view.
                    let messages = self.chat.messages();
                    let shown = added.min(messages.len());
                    for message in &messages[messages.len() - shown..] {
                        view.append_line(&ChatLine::from(message));
                    }
                    let stale = evicted.saturating_sub(added - shown);
                    if stale > 0 {
                        view.remove_oldest(stale);
                    }
                    Received::Appended { added, evicted }
                }
                SnapshotMerge::Replaced => {
                    view.replace_lines(&self.lines());
                    Received::Replaced { count: self.chat.len() }
                }
            },
        };
        view.scroll_to_latest();
        Ok(received)
    }

    fn lines(&self) -> Vec<ChatLine> {
        self.chat.messages().iter().map(ChatLine::from).collect()
    }
}
