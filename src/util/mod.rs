//! Shared rendering helpers.

pub mod render;
