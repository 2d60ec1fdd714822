//! # chatline
//!
//! Client for the WebSocket chat server. One client core, two hosts:
//!
//! - the browser host (`browser` feature, wasm32) wires the page's message
//!   list, input field and send button to a browser WebSocket;
//! - the terminal host (the `chatline` binary) reads lines from stdin and
//!   prints the conversation to stdout over `tokio-tungstenite`.
//!
//! Both hosts drive the same [`client::ChatClient`] through the
//! [`client::FrameSink`] and [`client::ChatView`] seams.

pub mod client;
pub mod config;
pub mod net;
pub mod state;
pub mod util;

#[cfg(not(target_arch = "wasm32"))]
pub mod term;

#[cfg(all(feature = "browser", target_arch = "wasm32"))]
pub mod browser;
