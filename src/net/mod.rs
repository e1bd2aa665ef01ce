//! Network layer.
//!
//! Binding only; connection handling is left to Axum/Hyper.

pub mod listener;

pub use listener::{bind, ListenerError};
