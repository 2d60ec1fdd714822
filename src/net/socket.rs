//! WebSocket session loop for the terminal host.
//!
//! DESIGN
//! ======
//! One task owns the [`ChatClient`] and multiplexes three sources in a
//! `select!` loop: stdin lines, inbound socket frames and the shutdown
//! signal. Lines are only consumed while connected; lines typed during a
//! reconnect wait in the channel and go out once the socket is back.
//!
//! Accepted frames sit in an [`Outbox`] that outlives each connection. A
//! frame leaves it only after the socket write succeeds, so a frame whose
//! write fails is sent again on the next connection.
//!
//! LIFECYCLE
//! =========
//! 1. Connect → `Connected`, backoff reset
//! 2. Drive until the socket drops, stdin ends, or shutdown fires
//! 3. On drop → `Reconnecting`, sleep the backoff delay, go to 1
//! 4. Out of attempts, stdin closed, or shutdown → `Closed`

#[cfg(test)]
#[path = "socket_test.rs"]
mod socket_test;

use std::collections::VecDeque;
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::client::{ChatClient, ClientError, FrameSink, SendOutcome};
use crate::net::backoff::Backoff;
use crate::state::connection::ConnectionStatus;
use crate::term::TerminalView;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INPUT_CHANNEL_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why [`run_session`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Shutdown,
    InputClosed,
    /// Reconnect attempts were exhausted.
    GaveUp,
}

enum DriveEnd {
    Disconnected,
    Shutdown,
    InputClosed,
}

/// Frames accepted by the client, waiting to be written to the socket.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: VecDeque<String>,
}

impl Outbox {
    /// Frames not yet written.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Write queued frames in order. The first failed write stops the flush
    /// and leaves that frame at the front of the queue.
    pub async fn flush<S>(&mut self, sink: &mut S) -> Result<(), S::Error>
    where
        S: Sink<Message> + Unpin,
    {
        while let Some(text) = self.frames.front() {
            sink.send(Message::Text(text.clone().into())).await?;
            self.frames.pop_front();
        }
        Ok(())
    }
}

impl FrameSink for Outbox {
    fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        self.frames.push_back(text);
        Ok(())
    }
}

/// Forward stdin lines into a channel until EOF.
pub fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Run the chat session until shutdown, end of input, or reconnects run out.
pub async fn run_session<W: Write, N: Write>(
    client: &mut ChatClient,
    view: &mut TerminalView<W, N>,
    mut input: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) -> SessionEnd {
    let endpoint = client.config().endpoint.clone();
    let mut backoff = Backoff::new(client.config().reconnect);
    let mut outbox = Outbox::default();

    loop {
        if *shutdown.borrow() {
            client.set_status(ConnectionStatus::Closed);
            return SessionEnd::Shutdown;
        }

        client.set_status(ConnectionStatus::Connecting);
        match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(endpoint.as_str())).await {
            Ok(Ok((stream, _))) => {
                backoff.reset();
                client.set_status(ConnectionStatus::Connected);
                info!(%endpoint, "chat connected");
                view.notice(&format!("connected to {endpoint}"));

                match drive(stream, client, view, &mut outbox, &mut input, &mut shutdown).await {
                    DriveEnd::Shutdown => {
                        client.set_status(ConnectionStatus::Closed);
                        return SessionEnd::Shutdown;
                    }
                    DriveEnd::InputClosed => {
                        client.set_status(ConnectionStatus::Closed);
                        return SessionEnd::InputClosed;
                    }
                    DriveEnd::Disconnected => warn!(%endpoint, "chat connection lost"),
                }
            }
            Ok(Err(e)) => warn!(%endpoint, error = %e, "chat connect failed"),
            Err(_) => warn!(%endpoint, timeout_secs = CONNECT_TIMEOUT.as_secs(), "chat connect timed out"),
        }

        let Some(delay) = backoff.next_delay() else {
            client.set_status(ConnectionStatus::Closed);
            warn!(attempts = backoff.attempts(), unsent = outbox.pending(), "giving up on chat reconnect");
            view.notice("connection lost; giving up");
            return SessionEnd::GaveUp;
        };
        client.set_status(ConnectionStatus::Reconnecting);
        view.notice(&format!("disconnected; retrying in {}ms", delay.as_millis()));

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if stop_requested(changed, &shutdown) {
                    client.set_status(ConnectionStatus::Closed);
                    return SessionEnd::Shutdown;
                }
            }
        }
    }
}

/// Pump one connection until it ends.
async fn drive<W: Write, N: Write>(
    stream: WsStream,
    client: &mut ChatClient,
    view: &mut TerminalView<W, N>,
    outbox: &mut Outbox,
    input: &mut mpsc::Receiver<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> DriveEnd {
    let (mut write, mut read) = stream.split();
    if outbox.pending() > 0 {
        info!(frames = outbox.pending(), "resending unsent chat frames");
        if !write_pending(outbox, &mut write).await {
            return DriveEnd::Disconnected;
        }
    }

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    close(&mut write).await;
                    return DriveEnd::InputClosed;
                };
                view.stage_input(line);
                match client.send(&mut *view, &mut *outbox) {
                    Ok(SendOutcome::Sent) => {}
                    Ok(SendOutcome::Skipped) => continue,
                    Err(e) => {
                        warn!(error = %e, "chat message not sent");
                        view.notice(&format!("message not sent: {e}"));
                        continue;
                    }
                }
                if !write_pending(outbox, &mut write).await {
                    return DriveEnd::Disconnected;
                }
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = client.receive(text.as_str(), &mut *view) {
                        warn!(error = %e, "dropping inbound chat frame");
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed chat socket");
                    return DriveEnd::Disconnected;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "chat socket read failed");
                    return DriveEnd::Disconnected;
                }
                None => return DriveEnd::Disconnected,
            },
            changed = shutdown.changed() => {
                if stop_requested(changed, shutdown) {
                    close(&mut write).await;
                    return DriveEnd::Shutdown;
                }
            }
        }
    }
}

async fn write_pending<S>(outbox: &mut Outbox, write: &mut S) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match outbox.flush(write).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, unsent = outbox.pending(), "chat socket write failed; keeping frames for reconnect");
            false
        }
    }
}

async fn close(write: &mut SplitSink<WsStream, Message>) {
    if let Err(e) = write.send(Message::Close(None)).await {
        debug!(error = %e, "close frame not delivered");
    }
}

/// A dropped shutdown sender counts as a shutdown request.
fn stop_requested(changed: Result<(), watch::error::RecvError>, shutdown: &watch::Receiver<bool>) -> bool {
    changed.is_err() || *shutdown.borrow()
}
