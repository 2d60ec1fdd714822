//! Browser host: binds the page's chat elements and starts the socket task.
//!
//! The page supplies its configuration as JSON in
//! `<script type="application/json" id="chat-config">`. Startup waits for
//! `DOMContentLoaded` when the document is still loading.

pub mod dom;
pub mod socket;

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentReadyState, Event, KeyboardEvent};

use self::dom::{DomError, DomView};
use self::socket::ChannelSink;
use crate::client::ChatClient;
use crate::config::ClientConfig;

pub const CONFIG_ELEMENT_ID: &str = "chat-config";

#[derive(Debug, thiserror::Error)]
enum StartError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("could not attach {event} listener: {detail}")]
    Listener { event: &'static str, detail: String },
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("console logging unavailable: {e}")));
    }

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::error!("{}", DomError::NoDocument);
        return;
    };

    if document.ready_state() == DocumentReadyState::Loading {
        let doc = document.clone();
        let on_ready = Closure::once(move || report(boot(&doc)));
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref()) {
            log::error!("could not wait for DOMContentLoaded: {e:?}");
            return;
        }
        on_ready.forget();
    } else {
        report(boot(&document));
    }
}

fn report(result: Result<(), StartError>) {
    if let Err(e) = result {
        log::error!("chat client not started: {e}");
    }
}

fn boot(document: &Document) -> Result<(), StartError> {
    let raw = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .ok_or_else(|| DomError::Missing(CONFIG_ELEMENT_ID.to_owned()))?;
    let config = ClientConfig::from_page_json(&raw)?;
    config.log_template_values();

    let view = Rc::new(RefCell::new(DomView::bind(document, &config.dom)?));
    let client = Rc::new(RefCell::new(ChatClient::new(config)));
    let (tx, rx) = mpsc::unbounded::<String>();

    wire_send(&client, &view, &tx)?;
    wire_pagehide(tx)?;

    wasm_bindgen_futures::spawn_local(socket::run(client, view, rx));
    Ok(())
}

/// Button click and Enter in the input field both send.
fn wire_send(
    client: &Rc<RefCell<ChatClient>>,
    view: &Rc<RefCell<DomView>>,
    tx: &mpsc::UnboundedSender<String>,
) -> Result<(), StartError> {
    let send = {
        let client = Rc::clone(client);
        let view = Rc::clone(view);
        let tx = tx.clone();
        move || send_from_input(&client, &view, &tx)
    };

    let on_click = {
        let send = send.clone();
        Closure::wrap(Box::new(move |_ev: Event| send()) as Box<dyn FnMut(Event)>)
    };
    let on_key = Closure::wrap(Box::new(move |ev: Event| {
        let enter = ev.dyn_ref::<KeyboardEvent>().is_some_and(|k| k.key() == "Enter" && !k.is_composing());
        if enter {
            ev.prevent_default();
            send();
        }
    }) as Box<dyn FnMut(Event)>);

    let view = view.borrow();
    listen(view.send_button(), "click", &on_click)?;
    listen(view.input(), "keydown", &on_key)?;
    on_click.forget();
    on_key.forget();
    Ok(())
}

fn send_from_input(client: &Rc<RefCell<ChatClient>>, view: &Rc<RefCell<DomView>>, tx: &mpsc::UnboundedSender<String>) {
    let (Ok(mut client), Ok(mut view)) = (client.try_borrow_mut(), view.try_borrow_mut()) else {
        log::warn!("chat state busy; send ignored");
        return;
    };
    let mut sink = ChannelSink::new(tx.clone());
    if let Err(e) = client.send(&mut *view, &mut sink) {
        log::warn!("chat message not sent: {e}");
    }
}

/// Closing the outbound channel on `pagehide` ends the socket task.
fn wire_pagehide(tx: mpsc::UnboundedSender<String>) -> Result<(), StartError> {
    let Some(window) = web_sys::window() else {
        return Err(DomError::NoDocument.into());
    };
    let on_hide = Closure::wrap(Box::new(move |_ev: Event| tx.close_channel()) as Box<dyn FnMut(Event)>);
    listen(&window, "pagehide", &on_hide)?;
    on_hide.forget();
    Ok(())
}

fn listen(
    target: &web_sys::EventTarget,
    event: &'static str,
    callback: &Closure<dyn FnMut(Event)>,
) -> Result<(), StartError> {
    target
        .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
        .map_err(|e| StartError::Listener { event, detail: format!("{e:?}") })
}
