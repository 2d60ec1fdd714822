//! Client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by concern (`chat` transcript, `connection` status) so each
//! host can observe the piece it renders without reaching into the other.

pub mod chat;
pub mod connection;
