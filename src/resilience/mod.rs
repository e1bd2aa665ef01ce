//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Routes file changed:
//!     → watcher reads it, compares length + mtime before and after
//!     → On mismatch: backoff.rs (wait, then read again)
//!     → Attempts exhausted: keep the previously published routes
//! ```
//!
//! # Design Decisions
//! - A reader never parses a file a writer is halfway through
//! - Jittered backoff so a slow writer is not polled in lockstep

pub mod backoff;
