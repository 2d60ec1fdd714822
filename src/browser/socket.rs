//! Browser WebSocket lifecycle: connect, pump frames, reconnect with backoff.
//!
//! Outbound frames arrive on an unbounded channel fed by [`ChannelSink`]. The
//! channel outlives individual sockets; closing it (page hide) ends the loop.
//! A frame whose write fails is held and written first on the next socket.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures::future::{Either, select};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::futures::WebSocket;
use gloo_net::websocket::{Message, State};

use super::dom::DomView;
use crate::client::{ChatClient, ClientError, FrameSink};
use crate::net::backoff::Backoff;
use crate::state::connection::ConnectionStatus;

const OPEN_POLL: Duration = Duration::from_millis(50);

/// [`FrameSink`] feeding the socket task.
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelSink {
    fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        self.tx.unbounded_send(text).map_err(|e| ClientError::Transport(e.to_string()))
    }
}

enum SessionEnd {
    Dropped,
    /// Outbound channel closed; the page is going away.
    PageClosed,
}

/// Keep a socket open until the page closes or reconnects run out.
pub async fn run(client: Rc<RefCell<ChatClient>>, view: Rc<RefCell<DomView>>, mut outbound: UnboundedReceiver<String>) {
    let (endpoint, reconnect) = {
        let client = client.borrow();
        (client.config().endpoint.clone(), client.config().reconnect)
    };
    let mut backoff = Backoff::new(reconnect);
    let mut unsent: Option<String> = None;

    loop {
        client.borrow_mut().set_status(ConnectionStatus::Connecting);
        match connect_and_run(&endpoint, &client, &view, &mut outbound, &mut unsent, &mut backoff).await {
            Ok(SessionEnd::PageClosed) => {
                client.borrow_mut().set_status(ConnectionStatus::Closed);
                log::info!("chat socket closed with page");
                return;
            }
            Ok(SessionEnd::Dropped) => log::warn!("chat connection lost"),
            Err(e) => log::warn!("chat connect failed: {e}"),
        }

        let Some(delay) = backoff.next_delay() else {
            client.borrow_mut().set_status(ConnectionStatus::Closed);
            log::error!("giving up on chat reconnect after {} attempts", backoff.attempts());
            return;
        };
        client.borrow_mut().set_status(ConnectionStatus::Reconnecting);
        log::info!("chat reconnecting in {}ms", delay.as_millis());
        gloo_timers::future::sleep(delay).await;
    }
}

async fn connect_and_run(
    url: &str,
    client: &Rc<RefCell<ChatClient>>,
    view: &Rc<RefCell<DomView>>,
    outbound: &mut UnboundedReceiver<String>,
    unsent: &mut Option<String>,
    backoff: &mut Backoff,
) -> Result<SessionEnd, String> {
    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    wait_open(&ws).await?;
    backoff.reset();
    client.borrow_mut().set_status(ConnectionStatus::Connected);
    log::info!("chat connected to {url}");

    let (mut ws_write, mut ws_read) = ws.split();

    let send_task = async {
        loop {
            let text = match unsent.take() {
                Some(text) => text,
                None => match outbound.next().await {
                    Some(text) => text,
                    None => return SessionEnd::PageClosed,
                },
            };
            if let Err(e) = ws_write.send(Message::Text(text.clone())).await {
                log::warn!("chat socket write failed; keeping frame for reconnect: {e}");
                *unsent = Some(text);
                return SessionEnd::Dropped;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => receive(client, view, &text),
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    log::warn!("chat socket read failed: {e}");
                    break;
                }
            }
        }
        SessionEnd::Dropped
    };

    let end = match select(Box::pin(send_task), Box::pin(recv_task)).await {
        Either::Left((end, _)) | Either::Right((end, _)) => end,
    };
    Ok(end)
}

async fn wait_open(ws: &WebSocket) -> Result<(), String> {
    loop {
        match ws.state() {
            State::Open => return Ok(()),
            State::Connecting => gloo_timers::future::sleep(OPEN_POLL).await,
            State::Closing | State::Closed => return Err("socket closed before opening".to_owned()),
        }
    }
}

fn receive(client: &Rc<RefCell<ChatClient>>, view: &Rc<RefCell<DomView>>, text: &str) {
    let (Ok(mut client), Ok(mut view)) = (client.try_borrow_mut(), view.try_borrow_mut()) else {
        log::warn!("chat state busy; dropping inbound frame");
        return;
    };
    if let Err(e) = client.receive(text, &mut *view) {
        log::warn!("dropping inbound chat frame: {e}");
    }
}
