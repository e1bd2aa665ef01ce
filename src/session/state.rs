//! Session lifecycle states.
//!
//! # State Transitions
//! ```text
//! Idle → Starting: start(root)
//! Starting → Running: resolver, routes, watcher, handler and listener all up
//! Starting → Idle: any start step failed (everything built so far torn down)
//! Running → Stopping: stop(), or start() on a running session
//! Stopping → Idle: server drained, watcher joined
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
