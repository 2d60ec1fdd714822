//! Networking modules for the chat wire protocol.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the JSON wire schema, `backoff` the reconnect policy
//! shared by both hosts. `socket` runs the tokio session loop and `api`
//! obtains session tokens over HTTP; both exist only in the terminal host.

pub mod backoff;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod socket;
