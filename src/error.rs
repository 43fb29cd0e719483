//! Error types used by the notification service and dispatch queues.
//!
//! This module defines three enums:
//!
//! - [`NotifyError`]: registration and lifecycle errors raised by the service.
//! - [`DispatchError`]: a queue refused a unit of work.
//! - [`RuntimeError`]: shutdown could not complete within its grace period.
//!
//! All of them provide `as_label` / `as_message` helpers for logs and metrics.

use std::time::Duration;
use thiserror::Error;

use crate::core::ServiceState;

/// # Errors produced by the notification service.
///
/// `FeedNotFound` and `DuplicateBinding` are recoverable: the caller can fix the
/// registration order and retry. `InvalidLifecycle` is a contract violation
/// (see [`NotifyError::is_fatal`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// A handler was registered against a feed that does not exist.
    #[error("feed {feed:?} not found")]
    FeedNotFound {
        /// Name of the missing feed.
        feed: String,
    },

    /// The same handler instance is already bound to this feed and queue.
    #[error("handler {handler:?} already bound to feed {feed:?} on queue {queue:?}")]
    DuplicateBinding {
        /// Feed name.
        feed: String,
        /// Dispatch queue key.
        queue: String,
        /// Handler name.
        handler: String,
    },

    /// An operation was attempted in a lifecycle state that does not allow it,
    /// e.g. registering a feed after `start`.
    #[error("cannot {op} while service is {state}")]
    InvalidLifecycle {
        /// The rejected operation.
        op: &'static str,
        /// State the service was in.
        state: ServiceState,
    },
}

impl NotifyError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use feedvisor::NotifyError;
    ///
    /// let err = NotifyError::FeedNotFound { feed: "blocks".into() };
    /// assert_eq!(err.as_label(), "notify_feed_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyError::FeedNotFound { .. } => "notify_feed_not_found",
            NotifyError::DuplicateBinding { .. } => "notify_duplicate_binding",
            NotifyError::InvalidLifecycle { .. } => "notify_invalid_lifecycle",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            NotifyError::FeedNotFound { feed } => format!("feed not found: {feed}"),
            NotifyError::DuplicateBinding {
                feed,
                queue,
                handler,
            } => format!("duplicate binding: {handler} on {feed}@{queue}"),
            NotifyError::InvalidLifecycle { op, state } => {
                format!("invalid lifecycle: {op} in state {state}")
            }
        }
    }

    /// Indicates a programming error rather than a recoverable condition.
    ///
    /// Returns `true` only for [`NotifyError::InvalidLifecycle`]: the service was
    /// wired in the wrong order and late registrations would never be delivered.
    ///
    /// # Example
    /// ```
    /// use feedvisor::{NotifyError, ServiceState};
    ///
    /// let late = NotifyError::InvalidLifecycle { op: "register feed", state: ServiceState::Running };
    /// assert!(late.is_fatal());
    ///
    /// let missing = NotifyError::FeedNotFound { feed: "blocks".into() };
    /// assert!(!missing.is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, NotifyError::InvalidLifecycle { .. })
    }
}

/// # Errors returned by [`DispatchQueue::submit`](crate::DispatchQueue::submit).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The queue was shut down and no longer accepts work.
    #[error("queue {queue:?} is closed")]
    QueueClosed {
        /// Queue key.
        queue: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::QueueClosed { .. } => "dispatch_queue_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::QueueClosed { queue } => format!("queue closed: {queue}"),
        }
    }
}

/// # Errors produced while shutting the runtime down.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; the listed units had to be aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the listeners or queues that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use feedvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck={stuck:?}")
            }
        }
    }
}
