//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Session start (crate::session):
//!     Resolver → initial routes → watcher → handler → bind
//!
//! Session stop:
//!     shutdown.rs trigger → server drains → watcher joined → Idle
//!
//! Signals (signals.rs):
//!     SIGINT → binary stops its session and exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
