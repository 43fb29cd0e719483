//! # Service lifecycle states.
//!
//! ```text
//! Stopped ──start()──► Running ──stop()──► Halted
//!    │                                        ▲
//!    └──────────────────stop()────────────────┘
//! ```
//! Halted is terminal: a halted service cannot be started again.

use std::fmt;

/// Lifecycle state of a [`NotificationService`](crate::NotificationService).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Initial state; feeds and handlers may be registered.
    Stopped,
    /// Listeners are live; registration is closed.
    Running,
    /// Shutdown signalled; terminal.
    Halted,
}

impl ServiceState {
    /// Returns a short stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Running => "running",
            ServiceState::Halted => "halted",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
