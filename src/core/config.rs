//! # Service configuration.
//!
//! Provides [`Config`] centralized settings for the notification service.
//!
//! ## Sentinel values
//! - `grace = 0s` → `shutdown()` signals listeners but does not wait for them
//! - `feed_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the notification service.
///
/// ## Field semantics
/// - `feed_capacity`: per-listener inbox size on each feed (min 1)
/// - `grace`: maximum wait for listeners to exit on shutdown (`0s` = no wait)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sprinkling sentinel
/// checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of events a listener may hold before `dispatch` has to wait for it.
    ///
    /// With the default of `1`, `dispatch` returns once every listener has taken
    /// the event into its inbox.
    pub feed_capacity: usize,

    /// Maximum time to wait for graceful shutdown before aborting.
    pub grace: Duration,
}

impl Config {
    /// Returns the feed inbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn feed_capacity_clamped(&self) -> usize {
        self.feed_capacity.max(1)
    }

    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `feed_capacity = 1` (dispatch waits for every listener to receive)
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            feed_capacity: 1,
            grace: Duration::from_secs(5),
        }
    }
}
